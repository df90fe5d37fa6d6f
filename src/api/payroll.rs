use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::api::attendance::month_or_current;
use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::repository::MySqlAcademyRepository;
use crate::services::payroll::monthly_payroll;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    /// `YYYY-MM`, defaults to the current month
    #[schema(example = "2026-02")]
    pub month: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = crate::model::payroll::MonthlyPayroll),
        (status = 400, description = "Invalid month"),
        (status = 403)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    repo: web::Data<MySqlAcademyRepository>,
    config: web::Data<Config>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_manager()?;

    let range = month_or_current(query.month.as_deref())?;
    let payroll = monthly_payroll(repo.get_ref(), &config.payroll, range).await?;

    Ok(HttpResponse::Ok().json(payroll))
}
