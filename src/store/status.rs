//! Request status lifecycle, mirroring `RequestStatus int` in the original
//! `libgetgood/database.go` and the wire encoding in spec.md §6
//! (`0=Unprocessed, 1=Inflight, 2=Failed, 3=Processed`).

/// Status of a single request record.
///
/// A record never moves backward except for the two explicit resume-time
/// resets (`Inflight -> Unprocessed`, `Failed -> Unprocessed`) performed by
/// the Supervisor at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum RequestStatus {
    Unprocessed = 0,
    Inflight = 1,
    Failed = 2,
    Processed = 3,
}

impl TryFrom<i64> for RequestStatus {
    type Error = i64;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(RequestStatus::Unprocessed),
            1 => Ok(RequestStatus::Inflight),
            2 => Ok(RequestStatus::Failed),
            3 => Ok(RequestStatus::Processed),
            other => Err(other),
        }
    }
}
