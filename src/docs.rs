use crate::api::attendance::{AttendanceQuery, ClockRequest};
use crate::api::coach::{CoachListResponse, CreateCoach, CreatedCoach};
use crate::api::payroll::PayrollQuery;
use crate::api::pt_session::{CreatePtSession, PtSessionQuery};
use crate::api::pt_subscription::{CreatePtSubscription, PtSubscriptionQuery};
use crate::api::skill::{AssessmentView, CreateAssessment};
use crate::api::student::{CreateStudent, StudentListResponse, StudentQuery};
use crate::model::attendance::{AttendanceStatus, CoachAttendance, LiveStatus};
use crate::model::coach::{Coach, StaffRole};
use crate::model::payroll::{MonthlyPayroll, PayrollRow};
use crate::model::pt_session::PtSession;
use crate::model::pt_subscription::{PtSubscription, SubscriptionBalance};
use crate::model::skill::{Skill, SkillAssessment};
use crate::model::student::{Student, TrainingScheduleEntry};
use crate::services::live_status::CoachOverview;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Gymnastics Academy API",
        version = "0.1.0",
        description = r#"
## Gymnastics Academy Management

Back office for a gymnastics academy.

### Key Features
- **Staff**: coach roster with one entry per person and live on-shift status
- **Attendance**: daily coach check-in / check-out
- **PT sessions**: personal training billed per session, optionally drawn from prepaid bundles
- **Payroll**: monthly earnings derived from salary, PT sessions and worked hours
- **Students**: profiles, weekly training schedule and skill assessments

### Security
All endpoints expect a **JWT Bearer** token issued by the academy's auth provider.
Payroll and staff accounts are restricted to **admin** and **head coach** roles.
"#,
    ),
    paths(
        crate::api::coach::create_coach,
        crate::api::coach::list_coaches,
        crate::api::coach::coach_status,
        crate::api::coach::get_coach,
        crate::api::coach::update_coach,
        crate::api::coach::delete_coach,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::list_attendance,

        crate::api::pt_session::create_pt_session,
        crate::api::pt_session::list_pt_sessions,

        crate::api::pt_subscription::create_pt_subscription,
        crate::api::pt_subscription::list_pt_subscriptions,
        crate::api::pt_subscription::get_pt_subscription,

        crate::api::payroll::get_payroll,

        crate::api::student::create_student,
        crate::api::student::list_students,
        crate::api::student::get_student,
        crate::api::student::update_student,
        crate::api::student::delete_student,

        crate::api::skill::create_assessment,
        crate::api::skill::list_assessments
    ),
    components(
        schemas(
            StaffRole,
            Coach,
            CreateCoach,
            CreatedCoach,
            CoachOverview,
            CoachListResponse,
            LiveStatus,
            AttendanceStatus,
            CoachAttendance,
            ClockRequest,
            AttendanceQuery,
            PtSession,
            CreatePtSession,
            PtSessionQuery,
            PtSubscription,
            SubscriptionBalance,
            CreatePtSubscription,
            PtSubscriptionQuery,
            PayrollRow,
            MonthlyPayroll,
            PayrollQuery,
            Student,
            TrainingScheduleEntry,
            CreateStudent,
            StudentQuery,
            StudentListResponse,
            Skill,
            SkillAssessment,
            CreateAssessment,
            AssessmentView
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Coach", description = "Staff roster APIs"),
        (name = "Attendance", description = "Coach attendance APIs"),
        (name = "PT", description = "Personal training session APIs"),
        (name = "Payroll", description = "Monthly payroll APIs"),
        (name = "Student", description = "Student and skill assessment APIs"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_payroll_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/payroll"));
        assert!(doc.paths.paths.contains_key("/api/coaches/status"));
        assert!(doc.paths.paths.contains_key("/api/pt-subscriptions/{subscription_id}"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
