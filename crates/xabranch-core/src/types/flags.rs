//! Protocol flags and return codes.
//!
//! Transaction managers speak in the raw X/Open integers (`TMJOIN`,
//! `TMSUSPEND`, `XAER_NOTA`, ...). Inside `xabranch` every flag set is a closed
//! enum so that illegal combinations cannot reach the state machine; the
//! `TryFrom<i32>` conversions are the only place raw values are interpreted.

use std::fmt;

use crate::error::CoreError;

const TMNOFLAGS: i32 = 0;
const TMJOIN: i32 = 0x0020_0000;
const TMRESUME: i32 = 0x0800_0000;
const TMSUCCESS: i32 = 0x0400_0000;
const TMFAIL: i32 = 0x2000_0000;
const TMSUSPEND: i32 = 0x0200_0000;
const TMSTARTRSCAN: i32 = 0x0100_0000;
const TMENDRSCAN: i32 = 0x0080_0000;

/// Flags accepted by `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StartFlags {
    /// Begin work on a new branch.
    #[default]
    NoFlags,
    /// Join a branch the transaction manager already started elsewhere.
    Join,
    /// Resume a branch previously suspended with [`EndFlags::Suspend`].
    Resume,
}

impl StartFlags {
    /// The raw X/Open value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::NoFlags => TMNOFLAGS,
            Self::Join => TMJOIN,
            Self::Resume => TMRESUME,
        }
    }
}

impl TryFrom<i32> for StartFlags {
    type Error = CoreError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            TMNOFLAGS => Ok(Self::NoFlags),
            TMJOIN => Ok(Self::Join),
            TMRESUME => Ok(Self::Resume),
            other => Err(CoreError::validation(format!("invalid start flags: {other:#x}"))),
        }
    }
}

impl fmt::Display for StartFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NoFlags => "starts",
            Self::Join => "joins",
            Self::Resume => "resumes",
        })
    }
}

/// Flags accepted by `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EndFlags {
    /// The caller finished its work on the branch.
    #[default]
    Success,
    /// The work failed; the branch must roll back.
    Fail,
    /// The caller detaches temporarily and will resume later.
    Suspend,
}

impl EndFlags {
    /// The raw X/Open value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        match self {
            Self::Success => TMSUCCESS,
            Self::Fail => TMFAIL,
            Self::Suspend => TMSUSPEND,
        }
    }
}

impl TryFrom<i32> for EndFlags {
    type Error = CoreError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        match raw {
            TMSUCCESS => Ok(Self::Success),
            TMFAIL => Ok(Self::Fail),
            TMSUSPEND => Ok(Self::Suspend),
            other => Err(CoreError::validation(format!("invalid end flags: {other:#x}"))),
        }
    }
}

impl fmt::Display for EndFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Success => "ends",
            Self::Fail => "fails",
            Self::Suspend => "suspends",
        })
    }
}

/// Flags accepted by `recover`.
///
/// A recovery scan is opened with `start_scan` and closed with `end_scan`;
/// calls in between continue the scan. Both may be set for a single-call scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecoverFlags {
    /// Open a new scan.
    pub start_scan: bool,
    /// Close the scan after this call.
    pub end_scan: bool,
}

impl RecoverFlags {
    /// Continue a scan already in progress.
    pub const CONTINUE: Self = Self { start_scan: false, end_scan: false };
    /// Open a scan.
    pub const START_SCAN: Self = Self { start_scan: true, end_scan: false };
    /// Close a scan.
    pub const END_SCAN: Self = Self { start_scan: false, end_scan: true };
    /// Open and close a scan in a single call.
    pub const FULL_SCAN: Self = Self { start_scan: true, end_scan: true };

    /// The raw X/Open value.
    #[must_use]
    pub const fn raw(self) -> i32 {
        let mut raw = TMNOFLAGS;
        if self.start_scan {
            raw |= TMSTARTRSCAN;
        }
        if self.end_scan {
            raw |= TMENDRSCAN;
        }
        raw
    }
}

impl TryFrom<i32> for RecoverFlags {
    type Error = CoreError;

    fn try_from(raw: i32) -> Result<Self, Self::Error> {
        if raw & !(TMSTARTRSCAN | TMENDRSCAN) != 0 {
            return Err(CoreError::validation(format!("invalid recover flags: {raw:#x}")));
        }
        Ok(Self { start_scan: raw & TMSTARTRSCAN != 0, end_scan: raw & TMENDRSCAN != 0 })
    }
}

/// The vote returned by a successful `prepare`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrepareOutcome {
    /// The branch is prepared and waits for the commit decision.
    Ok,
    /// The branch made no changes and has already been completed.
    ReadOnly,
}

impl PrepareOutcome {
    /// The X/Open return code for this vote.
    #[must_use]
    pub const fn code(self) -> XaCode {
        match self {
            Self::Ok => XaCode::Ok,
            Self::ReadOnly => XaCode::ReadOnly,
        }
    }
}

/// X/Open return codes reported back to a transaction manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum XaCode {
    /// `XA_OK`: normal completion.
    Ok = 0,
    /// `XA_RDONLY`: the branch was read-only and has been committed.
    ReadOnly = 3,
    /// `XA_RBROLLBACK`: the branch was rolled back, or must be.
    RollbackOnly = 100,
    /// `XAER_RMERR`: the resource manager failed.
    ResourceError = -3,
    /// `XAER_NOTA`: the branch identifier is not known.
    NoTransaction = -4,
    /// `XAER_INVAL`: invalid arguments or caller state.
    InvalidState = -5,
    /// `XAER_PROTO`: the routine was invoked in an improper context.
    ProtocolViolation = -6,
}

impl XaCode {
    /// The raw integer value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}
