use std::convert::TryFrom;

use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time};

use crate::errors::RecordError;

/// The unit every weight is reported in.
pub const UNIT_OF_MEASUREMENT: &str = "kg";

/// The UTC offset written next to every decomposed timestamp. It is a
/// label only: the components themselves are always in UTC.
pub const TIMEZONE_UTC_OFFSET: i8 = 9;

/// The longest a drum may wait between being poured and being sealed.
pub const MAX_SEAL_DELAY: Duration = Duration::hours(2);

/// Lower bound of the weight range, inclusive.
pub const MIN_WEIGHT: f64 = 10.0;

/// Upper bound of the weight range, exclusive.
pub const MAX_WEIGHT: f64 = 50.0;

pub const DRUM_ID_PREFIX: &str = "drum-";
pub const BATCH_CODE_PREFIX: &str = "batch-";
pub const USER_ID_PREFIX: &str = "user-";

/// Length of the facial recognition scan hash in hex characters.
pub const SCAN_HASH_LENGTH: usize = 64;

/// The state of a drum’s tamper seal. On the wire this becomes the
/// `tamperStatusIsSealed`/`tamperStatusIsTampered` pair, of which
/// exactly one is true.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TamperStatus {
    Sealed,
    Tampered,
}

impl TamperStatus {
    pub fn is_sealed(self) -> bool {
        self == TamperStatus::Sealed
    }

    pub fn is_tampered(self) -> bool {
        self == TamperStatus::Tampered
    }

    fn from_flags(sealed: bool, tampered: bool) -> Result<Self, RecordError> {
        match (sealed, tampered) {
            (true, false) => Ok(TamperStatus::Sealed),
            (false, true) => Ok(TamperStatus::Tampered),
            _ => Err(RecordError::AmbiguousTamperStatus { sealed, tampered }),
        }
    }
}

/// Whether the location of a drum was uploaded, and by whom.
#[derive(Clone, Debug, PartialEq)]
pub struct LocationData {
    pub(crate) is_uploaded: bool,
    pub(crate) uploader_user_id: String,
}

impl LocationData {
    pub fn is_uploaded(&self) -> bool {
        self.is_uploaded
    }

    pub fn uploader_user_id(&self) -> &str {
        &self.uploader_user_id
    }
}

/// A single drum as reported by the feed.
///
/// Timestamps are held as instants with whole-second precision and only
/// decomposed into their calendar fields when serialized.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(into = "WireRecord", try_from = "WireRecord")]
pub struct DrumRecord {
    pub(crate) drum_id: String,
    pub(crate) batch_code: String,
    pub(crate) weight: f64,
    pub(crate) pour_date: OffsetDateTime,
    pub(crate) tamper_seal: OffsetDateTime,
    pub(crate) tamper_status: TamperStatus,
    pub(crate) location: LocationData,
    pub(crate) facial_recognition_scan_hash: String,
}

impl DrumRecord {
    pub fn drum_id(&self) -> &str {
        &self.drum_id
    }

    pub fn batch_code(&self) -> &str {
        &self.batch_code
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn unit_of_measurement(&self) -> &'static str {
        UNIT_OF_MEASUREMENT
    }

    pub fn pour_date(&self) -> OffsetDateTime {
        self.pour_date
    }

    pub fn tamper_seal(&self) -> OffsetDateTime {
        self.tamper_seal
    }

    pub fn tamper_status(&self) -> TamperStatus {
        self.tamper_status
    }

    pub fn location(&self) -> &LocationData {
        &self.location
    }

    pub fn facial_recognition_scan_hash(&self) -> &str {
        &self.facial_recognition_scan_hash
    }

    /// Checks every invariant a record must hold, returning the first
    /// one that is broken.
    pub fn validate(&self) -> Result<(), RecordError> {
        check_prefix(&self.drum_id, DRUM_ID_PREFIX)?;
        check_prefix(&self.batch_code, BATCH_CODE_PREFIX)?;
        check_prefix(&self.location.uploader_user_id, USER_ID_PREFIX)?;

        let hundredths = self.weight * 100.0;

        if !(MIN_WEIGHT..MAX_WEIGHT).contains(&self.weight)
            || (hundredths.round() - hundredths).abs() > 1e-6
        {
            return Err(RecordError::WeightOutOfRange(self.weight));
        }

        let delay = self.tamper_seal - self.pour_date;

        if delay.is_negative() || delay > MAX_SEAL_DELAY {
            return Err(RecordError::SealOutsideWindow {
                pour_date: self.pour_date,
                tamper_seal: self.tamper_seal,
            });
        }

        let hash = &self.facial_recognition_scan_hash;

        if hash.len() != SCAN_HASH_LENGTH
            || !hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return Err(RecordError::MalformedScanHash(hash.clone()));
        }

        Ok(())
    }
}

fn check_prefix(value: &str, prefix: &'static str) -> Result<(), RecordError> {
    if value.len() > prefix.len() && value.starts_with(prefix) {
        Ok(())
    } else {
        Err(RecordError::MissingPrefix {
            value: value.to_owned(),
            prefix,
        })
    }
}

/// The calendar fields of an instant, read in UTC.
struct Components {
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl Components {
    fn of(instant: OffsetDateTime) -> Self {
        Components {
            year: instant.year(),
            month: u8::from(instant.month()),
            day: instant.day(),
            hour: instant.hour(),
            minute: instant.minute(),
            second: instant.second(),
        }
    }

    fn instant(&self) -> Result<OffsetDateTime, RecordError> {
        let date = Date::from_calendar_date(self.year, Month::try_from(self.month)?, self.day)?;
        let time = Time::from_hms(self.hour, self.minute, self.second)?;

        Ok(PrimitiveDateTime::new(date, time).assume_utc())
    }
}

/// The flat shape downstream consumers expect.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct WireRecord {
    drum_id: String,
    batch_code: String,
    weight: f64,
    unit_of_measurement: String,
    pour_date_timestamp_year: i32,
    pour_date_timestamp_month: u8,
    pour_date_timestamp_day: u8,
    pour_date_timestamp_hour: u8,
    pour_date_timestamp_minute: u8,
    pour_date_timestamp_second: u8,
    #[serde(rename = "pourDateTimestampTimezoneUTCOffset")]
    pour_date_timestamp_timezone_utc_offset: i8,
    tamper_seal_timestamp_year: i32,
    tamper_seal_timestamp_month: u8,
    tamper_seal_timestamp_day: u8,
    tamper_seal_timestamp_hour: u8,
    tamper_seal_timestamp_minute: u8,
    tamper_seal_timestamp_second: u8,
    #[serde(rename = "tamperSealTimestampTimezoneUTCOffset")]
    tamper_seal_timestamp_timezone_utc_offset: i8,
    tamper_status_is_sealed: bool,
    tamper_status_is_tampered: bool,
    location_data_is_uploaded: bool,
    location_data_uploader_user_id: String,
    facial_recognition_scan_hash: String,
}

impl From<DrumRecord> for WireRecord {
    fn from(record: DrumRecord) -> Self {
        let pour = Components::of(record.pour_date);
        let seal = Components::of(record.tamper_seal);

        WireRecord {
            drum_id: record.drum_id,
            batch_code: record.batch_code,
            weight: record.weight,
            unit_of_measurement: UNIT_OF_MEASUREMENT.to_owned(),
            pour_date_timestamp_year: pour.year,
            pour_date_timestamp_month: pour.month,
            pour_date_timestamp_day: pour.day,
            pour_date_timestamp_hour: pour.hour,
            pour_date_timestamp_minute: pour.minute,
            pour_date_timestamp_second: pour.second,
            pour_date_timestamp_timezone_utc_offset: TIMEZONE_UTC_OFFSET,
            tamper_seal_timestamp_year: seal.year,
            tamper_seal_timestamp_month: seal.month,
            tamper_seal_timestamp_day: seal.day,
            tamper_seal_timestamp_hour: seal.hour,
            tamper_seal_timestamp_minute: seal.minute,
            tamper_seal_timestamp_second: seal.second,
            tamper_seal_timestamp_timezone_utc_offset: TIMEZONE_UTC_OFFSET,
            tamper_status_is_sealed: record.tamper_status.is_sealed(),
            tamper_status_is_tampered: record.tamper_status.is_tampered(),
            location_data_is_uploaded: record.location.is_uploaded,
            location_data_uploader_user_id: record.location.uploader_user_id,
            facial_recognition_scan_hash: record.facial_recognition_scan_hash,
        }
    }
}

impl TryFrom<WireRecord> for DrumRecord {
    type Error = RecordError;

    fn try_from(wire: WireRecord) -> Result<Self, Self::Error> {
        if wire.unit_of_measurement != UNIT_OF_MEASUREMENT {
            return Err(RecordError::UnknownUnit(wire.unit_of_measurement));
        }

        for offset in &[
            wire.pour_date_timestamp_timezone_utc_offset,
            wire.tamper_seal_timestamp_timezone_utc_offset,
        ] {
            if *offset != TIMEZONE_UTC_OFFSET {
                return Err(RecordError::UnexpectedUtcOffset(*offset));
            }
        }

        let pour_date = Components {
            year: wire.pour_date_timestamp_year,
            month: wire.pour_date_timestamp_month,
            day: wire.pour_date_timestamp_day,
            hour: wire.pour_date_timestamp_hour,
            minute: wire.pour_date_timestamp_minute,
            second: wire.pour_date_timestamp_second,
        }
        .instant()?;

        let tamper_seal = Components {
            year: wire.tamper_seal_timestamp_year,
            month: wire.tamper_seal_timestamp_month,
            day: wire.tamper_seal_timestamp_day,
            hour: wire.tamper_seal_timestamp_hour,
            minute: wire.tamper_seal_timestamp_minute,
            second: wire.tamper_seal_timestamp_second,
        }
        .instant()?;

        let record = DrumRecord {
            drum_id: wire.drum_id,
            batch_code: wire.batch_code,
            weight: wire.weight,
            pour_date,
            tamper_seal,
            tamper_status: TamperStatus::from_flags(
                wire.tamper_status_is_sealed,
                wire.tamper_status_is_tampered,
            )?,
            location: LocationData {
                is_uploaded: wire.location_data_is_uploaded,
                uploader_user_id: wire.location_data_uploader_user_id,
            },
            facial_recognition_scan_hash: wire.facial_recognition_scan_hash,
        };

        record.validate()?;

        Ok(record)
    }
}
