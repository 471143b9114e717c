use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::db::operations::certificate::{self, Certificate, CertificateDetails};
use crate::db::operations::course;
use crate::db::operations::enrollment::{self, Enrollment};
use crate::db::operations::notification::{self, NewNotification, NotificationKind};
use crate::db::DatabaseProxy;
use crate::services::{require_student, ServiceError};

#[derive(Debug, Clone)]
pub enum IssueOutcome {
    Issued(Certificate),
    AlreadyIssued,
}

/// Whether an enrollment may receive a certificate under the configured policy.
pub fn check_eligibility(enrollment: &Enrollment, requires_completion: bool) -> Result<(), ServiceError> {
    if requires_completion && enrollment.progress < 100 {
        return Err(ServiceError::validation(
            "Course must be completed before a certificate is issued",
        ));
    }
    Ok(())
}

pub async fn issue(
    db: &DatabaseProxy,
    config: &Config,
    email: &str,
    course_id: &str,
) -> Result<IssueOutcome, ServiceError> {
    let student = require_student(db.pool(), email).await?;
    let course = course::find_course(db.pool(), course_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Course does not exist"))?;
    let current = enrollment::find_enrollment(db.pool(), student.id, &course.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Enrollment does not exist"))?;

    if current.certificate_issued {
        return Ok(IssueOutcome::AlreadyIssued);
    }
    check_eligibility(&current, config.certificate_requires_completion)?;

    let now = Utc::now();
    let certificate_id = Uuid::new_v4().to_string();
    let verification_url = config.frontend_link(&format!("certificates/{certificate_id}"));

    let mut tx = db.begin().await?;

    if !enrollment::mark_certificate_issued(&mut *tx, current.id, now).await? {
        return Ok(IssueOutcome::AlreadyIssued);
    }

    let Some(issued) = certificate::insert_certificate_if_missing(
        &mut *tx,
        student.id,
        &course.id,
        &certificate_id,
        &verification_url,
        now,
    )
    .await?
    else {
        return Ok(IssueOutcome::AlreadyIssued);
    };

    let message = format!("Your certificate for {} is ready.", course.title);
    notification::insert_notification(
        &mut *tx,
        student.id,
        &NewNotification {
            kind: NotificationKind::Course,
            title: "Certificate Issued",
            message: &message,
            related_url: Some(&verification_url),
        },
        now,
    )
    .await?;

    tx.commit().await?;

    tracing::info!(
        student_id = student.id,
        course_id = %course.id,
        certificate_id = %issued.certificate_id,
        "certificate issued"
    );

    Ok(IssueOutcome::Issued(issued))
}

pub async fn verify(db: &DatabaseProxy, certificate_id: &str) -> Result<CertificateDetails, ServiceError> {
    certificate::find_certificate(db.pool(), certificate_id.trim())
        .await?
        .ok_or_else(|| ServiceError::not_found("Certificate does not exist"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;

    fn enrollment_at(progress: i64) -> Enrollment {
        Enrollment {
            id: 1,
            student_id: 1,
            course_id: "python".to_string(),
            course_title: "Python".to_string(),
            status: "In Progress".to_string(),
            progress,
            enrolled_date: Utc::now(),
            last_updated: Utc::now(),
            quiz_scores: Json(Vec::new()),
            completion_date: None,
            certificate_issued: false,
        }
    }

    #[test]
    fn default_policy_issues_at_any_progress() {
        assert!(check_eligibility(&enrollment_at(10), false).is_ok());
    }

    #[test]
    fn strict_policy_requires_full_progress() {
        assert!(check_eligibility(&enrollment_at(99), true).is_err());
        assert!(check_eligibility(&enrollment_at(100), true).is_ok());
    }
}
