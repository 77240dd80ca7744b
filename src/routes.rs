use crate::{
    api::{self, faculty, leave, rector},
    auth::middleware::auth_middleware,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::anyhow;
use std::sync::Arc;

pub type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-peer-IP limiter refilling `requests_per_min` tokens a minute.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<Limiter> {
    let per_ms = (60_000 / u64::from(requests_per_min.max(1))).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} requests per minute"))?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: Arc<Limiter>) {
    // Protected routes
    cfg.service(
        web::scope(api_prefix)
            .app_data(web::JsonConfig::default().error_handler(api::json_error))
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(limiter) // rate limiting
            .service(
                web::scope("/leaves")
                    // /leaves/apply
                    .service(web::resource("/apply").route(web::post().to(leave::apply_leave)))
                    // /leaves/my-leaves
                    .service(web::resource("/my-leaves").route(web::get().to(leave::my_leaves)))
                    // /leaves/status/{id}
                    .service(
                        web::resource("/status/{id}")
                            .route(web::patch().to(leave::update_status)),
                    )
                    // /leaves/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave))),
            )
            .service(
                web::scope("/faculty")
                    .service(
                        web::resource("/leaves/pending")
                            .route(web::get().to(faculty::pending_leaves)),
                    )
                    .service(
                        web::resource("/approve/{id}")
                            .route(web::patch().to(faculty::approve_leave)),
                    )
                    .service(
                        web::resource("/reject/{id}")
                            .route(web::patch().to(faculty::reject_leave)),
                    ),
            )
            .service(
                web::scope("/rector")
                    .service(web::resource("/leaves").route(web::get().to(rector::all_leaves)))
                    .service(
                        web::resource("/leaves/pending")
                            .route(web::get().to(rector::pending_leaves)),
                    )
                    .service(
                        web::resource("/approve/{id}")
                            .route(web::patch().to(rector::approve_leave)),
                    )
                    .service(
                        web::resource("/reject/{id}")
                            .route(web::patch().to(rector::reject_leave)),
                    ),
            )
            .service(
                web::scope("/admin").service(
                    web::resource("/regenerate-pdf/{id}")
                        .route(web::post().to(rector::regenerate_pass)),
                ),
            ),
    );
}
