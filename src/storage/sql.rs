//! SQLite conversions for domain types
//!
//! IDs are stored as INTEGER rowids and enums as their lowercase tokens.
//! Dates and times go through rusqlite's chrono support (`YYYY-MM-DD`,
//! `HH:MM:SS`), which keeps lexicographic and chronological order equal.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::domain::{
    AppointmentId, AppointmentStatus, AvailabilityStatus, BlockId, BlockedDayId, ClientId,
    PetId, Role, ServiceId, StaffId,
};

macro_rules! sql_id {
    ($($name:ident),* $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.get()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    i64::column_result(value).map($name::new)
                }
            }
        )*
    };
}

sql_id!(StaffId, ClientId, PetId, ServiceId, BlockId, BlockedDayId, AppointmentId);

macro_rules! sql_token {
    ($($name:ident),* $(,)?) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse::<$name>()
                        .map_err(|e| FromSqlError::Other(Box::new(e)))
                }
            }
        )*
    };
}

sql_token!(AvailabilityStatus, AppointmentStatus, Role);
