use crate::{
    api::{attendance, branch},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);

    // both values are non-zero, the only case in which finish() returns None
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero rate limiter settings");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let check_in_limiter = Arc::new(build_limiter(config.rate_check_in_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/attendance")
                    // /attendance?date=
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    // /attendance/summary?date=
                    .service(
                        web::resource("/summary")
                            .route(web::get().to(attendance::attendance_summary)),
                    )
                    // /attendance/check-in
                    .service(
                        web::resource("/check-in")
                            .wrap(check_in_limiter)
                            .route(web::post().to(attendance::check_in)),
                    )
                    // /attendance/{id}/check-out
                    .service(
                        web::resource("/{id}/check-out")
                            .route(web::put().to(attendance::check_out)),
                    ),
            )
            .service(
                web::scope("/branches")
                    // /branches
                    .service(
                        web::resource("")
                            .route(web::get().to(branch::list_branches))
                            .route(web::post().to(branch::create_branch)),
                    )
                    // /branches/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(branch::get_branch))
                            .route(web::put().to(branch::update_branch)),
                    ),
            ),
    );
}
