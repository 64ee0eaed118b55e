use crate::{
    api::{balance, employee, leave, special_leave},
    auth::handlers,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let api_limiter = Arc::new(build_limiter(config.rate_api_per_min));

    // Mock auth routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // API routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter)
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    // /employees/{employee_id}
                    .service(
                        web::resource("/{employee_id}")
                            .route(web::get().to(employee::get_employee)),
                    )
                    // /employees/{employee_id}/subordinates
                    .service(
                        web::resource("/{employee_id}/subordinates")
                            .route(web::get().to(employee::get_subordinates)),
                    )
                    // /employees/{employee_id}/leaves
                    .service(
                        web::resource("/{employee_id}/leaves")
                            .route(web::get().to(leave::employee_leaves)),
                    )
                    // /employees/{employee_id}/balance
                    .service(
                        web::resource("/{employee_id}/balance")
                            .route(web::get().to(balance::get_employee_balance)),
                    )
                    // /employees/{employee_id}/special-leave-usage
                    .service(
                        web::resource("/{employee_id}/special-leave-usage")
                            .route(web::get().to(special_leave::get_special_leave_usage)),
                    ),
            )
            .service(
                web::scope("/managers")
                    // /managers/{manager_id}/leaves
                    .service(
                        web::resource("/{manager_id}/leaves")
                            .route(web::get().to(leave::manager_leaves)),
                    ),
            )
            .service(
                web::scope("/leaves")
                    // /leaves
                    .service(web::resource("").route(web::post().to(leave::create_leave)))
                    // /leaves/{leave_id}
                    .service(
                        web::resource("/{leave_id}")
                            .route(web::delete().to(leave::delete_leave)),
                    )
                    // /leaves/{leave_id}/status
                    .service(
                        web::resource("/{leave_id}/status")
                            .route(web::patch().to(leave::update_leave_status)),
                    ),
            ),
    );
}
