use crate::{
    api::{attendance, coach, payroll, pt_session, pt_subscription, skill, student},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{guard, middleware::from_fn, web};
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("rate limiter config is valid for non-zero period and burst");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let account_limiter = Arc::new(build_limiter(config.rate_account_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/coaches")
                    // POST /coaches creates staff accounts and gets its own limiter
                    .service(
                        web::resource("")
                            .guard(guard::Post())
                            .wrap(account_limiter)
                            .route(web::post().to(coach::create_coach)),
                    )
                    // GET /coaches
                    .service(web::resource("").route(web::get().to(coach::list_coaches)))
                    // /coaches/status, before /{id}
                    .service(web::resource("/status").route(web::get().to(coach::coach_status)))
                    // /coaches/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(coach::get_coach))
                            .route(web::put().to(coach::update_coach))
                            .route(web::delete().to(coach::delete_coach)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    ),
            )
            .service(
                web::scope("/pt-sessions").service(
                    web::resource("")
                        .route(web::get().to(pt_session::list_pt_sessions))
                        .route(web::post().to(pt_session::create_pt_session)),
                ),
            )
            .service(
                web::scope("/pt-subscriptions")
                    .service(
                        web::resource("")
                            .route(web::get().to(pt_subscription::list_pt_subscriptions))
                            .route(web::post().to(pt_subscription::create_pt_subscription)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(pt_subscription::get_pt_subscription)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    .service(web::resource("").route(web::get().to(payroll::get_payroll))),
            )
            .service(
                web::scope("/students")
                    // /students
                    .service(
                        web::resource("")
                            .route(web::get().to(student::list_students))
                            .route(web::post().to(student::create_student)),
                    )
                    // /students/{id}/skills
                    .service(
                        web::resource("/{id}/skills")
                            .route(web::get().to(skill::list_assessments))
                            .route(web::post().to(skill::create_assessment)),
                    )
                    // /students/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(student::get_student))
                            .route(web::put().to(student::update_student))
                            .route(web::delete().to(student::delete_student)),
                    ),
            ),
    );
}
