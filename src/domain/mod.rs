//! Domain models for the clinic scheduling core
//!
//! Contains the business rules without any I/O concerns: overlap
//! validation, slot arithmetic and the appointment state machine.

mod id;
mod clock;
mod slot;
mod error;
mod availability;
mod appointment;
mod people;

pub use id::{
    AppointmentId, BlockId, BlockedDayId, ClientId, IdError, PetId, ServiceId, StaffId,
    VeterinarianId,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use slot::{
    hhmm, parse_time, round_up_to_slot, slot_end, truncate_to_minute, Month, TimeRange,
    SLOT_MINUTES,
};
pub use error::{NotFoundError, ValidationError};
pub use availability::{
    validate_block, validate_day_mutation, AvailabilityBlock, AvailabilityStatus, BlockDraft,
    BlockedDay, DayToggle,
};
pub use appointment::{
    Appointment, AppointmentStatus, BookingRequest, RescheduleRequest, Rescheduled,
    StatusChange, TransitionPolicy, DEFAULT_CANCELLATION_REASON, RESCHEDULE_REASON,
};
pub use people::{
    Client, ClientRegistration, NewPet, NewService, NewStaff, Pet, Role, Service, Staff,
    StaffProfile, MAX_SERVICE_MINUTES,
};
