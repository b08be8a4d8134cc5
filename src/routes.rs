use crate::{
    api::{employee, ledger, leave_request},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter config
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let submit_limiter = build_limiter(config.rate_submit_per_min);
    let default_limiter = build_limiter(config.rate_default_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/employees")
                    // /employees
                    .service(
                        web::resource("")
                            .wrap(Governor::new(&default_limiter))
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .wrap(Governor::new(&default_limiter))
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    )
                    // /employees/{id}/balance
                    .service(
                        web::resource("/{id}/balance")
                            .wrap(Governor::new(&default_limiter))
                            .route(web::get().to(ledger::get_balance)),
                    )
                    // /employees/{id}/accrue
                    .service(
                        web::resource("/{id}/accrue")
                            .wrap(Governor::new(&default_limiter))
                            .route(web::post().to(ledger::accrue)),
                    )
                    // /employees/{id}/ledger
                    .service(
                        web::resource("/{id}/ledger")
                            .wrap(Governor::new(&default_limiter))
                            .route(web::get().to(ledger::monthly_ledger)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .wrap(Governor::new(&submit_limiter))
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .wrap(Governor::new(&default_limiter))
                            .route(web::get().to(leave_request::get_leave)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .wrap(Governor::new(&submit_limiter))
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .wrap(Governor::new(&submit_limiter))
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            ),
    );
}
