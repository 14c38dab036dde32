//! Typed customer record submitted for a premium quote

use crate::error::{PremiumError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Input column order used at training time
pub const FEATURE_COLUMNS: [&str; 6] = ["age", "sex", "bmi", "children", "smoker", "region"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Smoker {
    Yes,
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Northeast,
    Northwest,
    Southeast,
    Southwest,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }
}

impl Smoker {
    pub fn as_str(&self) -> &'static str {
        match self {
            Smoker::Yes => "yes",
            Smoker::No => "no",
        }
    }
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Northeast => "northeast",
            Region::Northwest => "northwest",
            Region::Southeast => "southeast",
            Region::Southwest => "southwest",
        }
    }
}

fn invalid(name: &str, value: &str, reason: &str) -> PremiumError {
    PremiumError::InvalidParameter {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl FromStr for Sex {
    type Err = PremiumError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Sex::Male),
            "female" => Ok(Sex::Female),
            _ => Err(invalid("sex", s, "expected male or female")),
        }
    }
}

impl FromStr for Smoker {
    type Err = PremiumError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "yes" => Ok(Smoker::Yes),
            "no" => Ok(Smoker::No),
            _ => Err(invalid("smoker", s, "expected yes or no")),
        }
    }
}

impl FromStr for Region {
    type Err = PremiumError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "northeast" => Ok(Region::Northeast),
            "northwest" => Ok(Region::Northwest),
            "southeast" => Ok(Region::Southeast),
            "southwest" => Ok(Region::Southwest),
            _ => Err(invalid(
                "region",
                s,
                "expected northeast, northwest, southeast or southwest",
            )),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Smoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applicant's six input fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub age: u32,
    pub sex: Sex,
    pub bmi: f64,
    pub children: u32,
    pub smoker: Smoker,
    pub region: Region,
}

impl CustomerRecord {
    /// Validated constructor
    pub fn new(age: u32, sex: Sex, bmi: f64, children: u32, smoker: Smoker, region: Region) -> Result<Self> {
        if age == 0 {
            return Err(invalid("age", "0", "must be positive"));
        }
        if !(bmi.is_finite() && bmi > 0.0) {
            return Err(invalid("bmi", &bmi.to_string(), "must be a positive number"));
        }
        Ok(Self {
            age,
            sex,
            bmi,
            children,
            smoker,
            region,
        })
    }

    /// Parse the six raw form fields. Enums are case-insensitive and
    /// numbers may carry surrounding whitespace.
    pub fn from_fields(
        age: &str,
        sex: &str,
        bmi: &str,
        children: &str,
        smoker: &str,
        region: &str,
    ) -> Result<Self> {
        let age_value = age
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid("age", age, "expected a positive integer"))?;
        let bmi_value = bmi
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid("bmi", bmi, "expected a number"))?;
        let children_value = children
            .trim()
            .parse::<u32>()
            .map_err(|_| invalid("children", children, "expected a non-negative integer"))?;

        Self::new(
            age_value,
            sex.parse()?,
            bmi_value,
            children_value,
            smoker.parse()?,
            region.parse()?,
        )
    }

    /// Single-row frame with the training column order and dtypes
    pub fn to_frame(&self) -> Result<DataFrame> {
        let df = DataFrame::new(vec![
            Column::new(FEATURE_COLUMNS[0].into(), &[self.age as i64]),
            Column::new(FEATURE_COLUMNS[1].into(), &[self.sex.as_str()]),
            Column::new(FEATURE_COLUMNS[2].into(), &[self.bmi]),
            Column::new(FEATURE_COLUMNS[3].into(), &[self.children as i64]),
            Column::new(FEATURE_COLUMNS[4].into(), &[self.smoker.as_str()]),
            Column::new(FEATURE_COLUMNS[5].into(), &[self.region.as_str()]),
        ])?;
        Ok(df)
    }
}
