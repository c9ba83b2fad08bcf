// Copyright (c) 2022 MASSA LABS <info@massa.net>
//! Unsigned time management
#![warn(missing_docs)]
#![warn(unused_crate_dependencies)]

mod error;
pub use error::TimeError;
use nom::error::{context, ContextError, ParseError};
use nom::IResult;
use quorum_serialization::{
    Deserializer, SerializeError, Serializer, U64VarIntDeserializer, U64VarIntSerializer,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Bound;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{
    convert::{TryFrom, TryInto},
    str::FromStr,
};

/// Time structure used everywhere: block times, completion times, jail release times.
/// milliseconds since 01/01/1970.
#[derive(
    Debug, Default, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct QuorumTime(u64);

/// Serializer for `QuorumTime`
#[derive(Clone)]
pub struct QuorumTimeSerializer {
    u64_serializer: U64VarIntSerializer,
}

impl QuorumTimeSerializer {
    /// Creates a `QuorumTimeSerializer`
    pub const fn new() -> Self {
        Self {
            u64_serializer: U64VarIntSerializer::new(),
        }
    }
}

impl Default for QuorumTimeSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Serializer<QuorumTime> for QuorumTimeSerializer {
    /// ```
    /// use quorum_serialization::Serializer;
    /// use quorum_time::{QuorumTime, QuorumTimeSerializer};
    ///
    /// let time: QuorumTime = QuorumTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// let serializer = QuorumTimeSerializer::new();
    /// serializer.serialize(&time, &mut serialized).unwrap();
    /// ```
    fn serialize(&self, value: &QuorumTime, buffer: &mut Vec<u8>) -> Result<(), SerializeError> {
        self.u64_serializer.serialize(&value.to_millis(), buffer)
    }
}

/// Deserializer for `QuorumTime`
#[derive(Clone)]
pub struct QuorumTimeDeserializer {
    u64_deserializer: U64VarIntDeserializer,
}

const fn bound_to_millis(bound: Bound<QuorumTime>) -> Bound<u64> {
    match bound {
        Bound::Included(t) => Bound::Included(t.to_millis()),
        Bound::Excluded(t) => Bound::Excluded(t.to_millis()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

impl QuorumTimeDeserializer {
    /// Creates a `QuorumTimeDeserializer`
    ///
    /// Arguments:
    /// * range: accepted range for the time to deserialize
    pub const fn new(range: (Bound<QuorumTime>, Bound<QuorumTime>)) -> Self {
        Self {
            u64_deserializer: U64VarIntDeserializer::new(
                bound_to_millis(range.0),
                bound_to_millis(range.1),
            ),
        }
    }
}

impl Default for QuorumTimeDeserializer {
    fn default() -> Self {
        Self::new((Bound::Unbounded, Bound::Unbounded))
    }
}

impl Deserializer<QuorumTime> for QuorumTimeDeserializer {
    /// ```
    /// use std::ops::Bound::Included;
    /// use quorum_serialization::{Serializer, Deserializer, DeserializeError};
    /// use quorum_time::{QuorumTime, QuorumTimeSerializer, QuorumTimeDeserializer};
    ///
    /// let time: QuorumTime = QuorumTime::from_millis(30);
    /// let mut serialized = Vec::new();
    /// let serializer = QuorumTimeSerializer::new();
    /// let deserializer = QuorumTimeDeserializer::new((Included(QuorumTime::from_millis(0)), Included(QuorumTime::from_millis(u64::MAX))));
    /// serializer.serialize(&time, &mut serialized).unwrap();
    /// let (rest, time_deser) = deserializer.deserialize::<DeserializeError>(&serialized).unwrap();
    /// assert!(rest.is_empty());
    /// assert_eq!(time, time_deser);
    /// ```
    fn deserialize<'a, E: ParseError<&'a [u8]> + ContextError<&'a [u8]>>(
        &self,
        buffer: &'a [u8],
    ) -> IResult<&'a [u8], QuorumTime, E> {
        context("Failed QuorumTime deserialization", |input| {
            self.u64_deserializer
                .deserialize(input)
                .map(|(rest, res)| (rest, QuorumTime::from_millis(res)))
        })(buffer)
    }
}

impl fmt::Display for QuorumTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_millis())
    }
}

impl TryFrom<Duration> for QuorumTime {
    type Error = TimeError;

    /// Conversion from `std::time::Duration`.
    /// ```
    /// # use std::time::Duration;
    /// # use quorum_time::*;
    /// # use std::convert::TryFrom;
    /// let duration: Duration = Duration::from_millis(42);
    /// let time : QuorumTime = QuorumTime::from_millis(42);
    /// assert_eq!(time, QuorumTime::try_from(duration).unwrap());
    /// ```
    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Ok(QuorumTime(
            value
                .as_millis()
                .try_into()
                .map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl From<QuorumTime> for Duration {
    /// Conversion to `std::time::Duration`.
    /// ```
    /// # use std::time::Duration;
    /// # use quorum_time::*;
    /// let duration: Duration = QuorumTime::from_millis(42).into();
    /// assert_eq!(duration, Duration::from_millis(42));
    /// ```
    fn from(value: QuorumTime) -> Self {
        Duration::from_millis(value.to_millis())
    }
}

impl FromStr for QuorumTime {
    type Err = TimeError;

    /// Conversion from `&str`, milliseconds.
    /// ```
    /// # use quorum_time::*;
    /// # use std::str::FromStr;
    /// assert_eq!(QuorumTime::from_str("42").unwrap(), QuorumTime::from_millis(42));
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(QuorumTime(
            u64::from_str(s).map_err(|_| TimeError::ConversionError)?,
        ))
    }
}

impl QuorumTime {
    /// The unix epoch, used as "never jailed"
    pub const EPOCH: QuorumTime = QuorumTime(0);

    /// One hour
    pub const HOUR: QuorumTime = QuorumTime(3_600_000);

    /// Conversion from `u64`, representing timestamp in milliseconds.
    /// ```
    /// # use quorum_time::*;
    /// let time : QuorumTime = QuorumTime::from_millis(42);
    /// ```
    pub const fn from_millis(value: u64) -> Self {
        QuorumTime(value)
    }

    /// Conversion from a number of seconds
    pub const fn from_secs(value: u64) -> Self {
        QuorumTime(value.saturating_mul(1000))
    }

    /// Gets current UNIX timestamp (resolution: milliseconds).
    pub fn now() -> Result<Self, TimeError> {
        let now: u64 = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TimeError::TimeOverflowError)?
            .as_millis()
            .try_into()
            .map_err(|_| TimeError::TimeOverflowError)?;
        Ok(QuorumTime(now))
    }

    /// Conversion to `u64`, representing milliseconds.
    /// ```
    /// # use quorum_time::*;
    /// let time : QuorumTime = QuorumTime::from_millis(42);
    /// assert_eq!(time.to_millis(), 42);
    /// ```
    pub const fn to_millis(&self) -> u64 {
        self.0
    }

    /// ```
    /// # use quorum_time::*;
    /// let time_1 : QuorumTime = QuorumTime::from_millis(42);
    /// let time_2 : QuorumTime = QuorumTime::from_millis(7);
    /// assert_eq!(time_1.saturating_sub(time_2), QuorumTime::from_millis(42-7))
    /// ```
    #[must_use]
    pub fn saturating_sub(self, t: QuorumTime) -> Self {
        QuorumTime(self.0.saturating_sub(t.0))
    }

    /// ```
    /// # use quorum_time::*;
    /// let time_1 : QuorumTime = QuorumTime::from_millis(42);
    /// let time_2 : QuorumTime = QuorumTime::from_millis(7);
    /// assert_eq!(time_1.saturating_add(time_2), QuorumTime::from_millis(42+7))
    /// ```
    #[must_use]
    pub fn saturating_add(self, t: QuorumTime) -> Self {
        QuorumTime(self.0.saturating_add(t.0))
    }

    /// ```
    /// # use quorum_time::*;
    /// let time_1 : QuorumTime = QuorumTime::from_millis(42);
    /// let time_2 : QuorumTime = QuorumTime::from_millis(7);
    /// assert_eq!(time_1.checked_sub(time_2).unwrap(), QuorumTime::from_millis(42-7))
    /// ```
    pub fn checked_sub(self, t: QuorumTime) -> Result<Self, TimeError> {
        self.0
            .checked_sub(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("subtraction error".to_string()))
            .map(QuorumTime)
    }

    /// ```
    /// # use quorum_time::*;
    /// let time_1 : QuorumTime = QuorumTime::from_millis(42);
    /// let time_2 : QuorumTime = QuorumTime::from_millis(7);
    /// assert_eq!(time_1.checked_add(time_2).unwrap(), QuorumTime::from_millis(42+7))
    /// ```
    pub fn checked_add(self, t: QuorumTime) -> Result<Self, TimeError> {
        self.0
            .checked_add(t.0)
            .ok_or_else(|| TimeError::CheckedOperationError("addition error".to_string()))
            .map(QuorumTime)
    }

    /// ```
    /// # use quorum_time::*;
    /// let time_1 : QuorumTime = QuorumTime::from_millis(42);
    /// assert_eq!(time_1.checked_mul(7).unwrap(), QuorumTime::from_millis(42*7))
    /// ```
    pub fn checked_mul(self, n: u64) -> Result<Self, TimeError> {
        self.0
            .checked_mul(n)
            .ok_or_else(|| TimeError::CheckedOperationError("multiplication error".to_string()))
            .map(QuorumTime)
    }

    /// Get max `QuorumTime` value
    pub const fn max() -> QuorumTime {
        QuorumTime::from_millis(u64::MAX)
    }
}
