// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{Appointment, AppointmentError, AppointmentStatus, PaymentStatus};

/// The one payment-gate predicate. Prescription writing and meeting-link
/// dispatch are both gated on this exact check; call sites must use it
/// rather than re-deriving the condition.
pub fn consultation_unlocked(appointment: &Appointment) -> bool {
    appointment.status == AppointmentStatus::Done
        && appointment.payment_status == PaymentStatus::Paid
}

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed.
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        debug!(
            "Validating status transition from {} to {}",
            current_status, new_status
        );

        if !self
            .valid_transitions(current_status)
            .contains(&new_status)
        {
            warn!(
                "Invalid status transition attempted: {} -> {}",
                current_status, new_status
            );
            return Err(AppointmentError::InvalidTransition(current_status));
        }

        Ok(())
    }

    /// All valid next statuses for a given current status. The doctor
    /// resolves a pending appointment exactly once; `Done` and `Declined`
    /// are terminal.
    pub fn valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![
                AppointmentStatus::Done,
                AppointmentStatus::Declined,
            ],
            AppointmentStatus::Done => vec![],
            AppointmentStatus::Declined => vec![],
        }
    }

    /// Cancellation is a patient action and only exists while the doctor
    /// has not yet resolved the appointment.
    pub fn can_cancel(&self, current_status: AppointmentStatus) -> bool {
        current_status == AppointmentStatus::Pending
    }

    /// Validate a payment attempt against the current payment state.
    pub fn validate_payment(
        &self,
        current: PaymentStatus,
        amount: i64,
    ) -> Result<(), AppointmentError> {
        if amount != crate::models::CONSULTATION_FEE {
            return Err(AppointmentError::InvalidAmount(amount));
        }
        if current == PaymentStatus::Paid {
            return Err(AppointmentError::AlreadyPaid);
        }
        Ok(())
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
