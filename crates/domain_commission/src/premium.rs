//! Premium facts of a policy
//!
//! Motor policies are rated per component (own-damage, third-party, net),
//! every other line is rated on a single base. The two shapes are a closed
//! enum so the calculator matches on them instead of probing optional fields.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::CommissionError;

/// Which motor cover was sold, and therefore which components must be keyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorCover {
    /// Own-damage plus third-party
    Comprehensive,
    /// Standalone own-damage
    OwnDamageOnly,
    /// Liability-only third-party
    ThirdPartyOnly,
}

impl MotorCover {
    /// Returns true if an OD premium must be supplied
    pub fn requires_od(&self) -> bool {
        matches!(self, MotorCover::Comprehensive | MotorCover::OwnDamageOnly)
    }

    /// Returns true if a TP premium must be supplied
    pub fn requires_tp(&self) -> bool {
        matches!(self, MotorCover::Comprehensive | MotorCover::ThirdPartyOnly)
    }

    /// Storage code
    pub fn code(&self) -> &'static str {
        match self {
            MotorCover::Comprehensive => "comprehensive",
            MotorCover::OwnDamageOnly => "od_only",
            MotorCover::ThirdPartyOnly => "tp_only",
        }
    }

    /// Parses a storage code
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "comprehensive" => Some(MotorCover::Comprehensive),
            "od_only" => Some(MotorCover::OwnDamageOnly),
            "tp_only" => Some(MotorCover::ThirdPartyOnly),
            _ => None,
        }
    }
}

/// Motor premium breakdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorPremium {
    pub cover: MotorCover,
    /// Gross premium including tax
    pub total: Decimal,
    /// Own-damage premium
    pub od: Option<Decimal>,
    /// Third-party premium
    pub tp: Option<Decimal>,
    /// Premium net of GST
    pub net: Option<Decimal>,
}

impl MotorPremium {
    /// Creates a motor premium with only the total keyed
    pub fn new(cover: MotorCover, total: Decimal) -> Self {
        Self {
            cover,
            total,
            od: None,
            tp: None,
            net: None,
        }
    }

    /// Sets the own-damage premium
    pub fn with_od(mut self, od: Decimal) -> Self {
        self.od = Some(od);
        self
    }

    /// Sets the third-party premium
    pub fn with_tp(mut self, tp: Decimal) -> Self {
        self.tp = Some(tp);
        self
    }

    /// Sets the net premium
    pub fn with_net(mut self, net: Decimal) -> Self {
        self.net = Some(net);
        self
    }
}

/// Premium for every non-motor line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardPremium {
    /// Gross premium including tax
    pub total: Decimal,
    /// Premium net of GST
    pub net: Option<Decimal>,
}

impl StandardPremium {
    /// Creates a standard premium
    pub fn new(total: Decimal) -> Self {
        Self { total, net: None }
    }

    /// Sets the net premium
    pub fn with_net(mut self, net: Decimal) -> Self {
        self.net = Some(net);
        self
    }
}

/// The premium facts of one policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyPremium {
    Motor(MotorPremium),
    Standard(StandardPremium),
}

impl PolicyPremium {
    /// Gross premium
    pub fn total(&self) -> Decimal {
        match self {
            PolicyPremium::Motor(m) => m.total,
            PolicyPremium::Standard(s) => s.total,
        }
    }

    /// Net premium, if keyed
    pub fn net(&self) -> Option<Decimal> {
        match self {
            PolicyPremium::Motor(m) => m.net,
            PolicyPremium::Standard(s) => s.net,
        }
    }

    /// Own-damage premium (motor only)
    pub fn od(&self) -> Option<Decimal> {
        match self {
            PolicyPremium::Motor(m) => m.od,
            PolicyPremium::Standard(_) => None,
        }
    }

    /// Third-party premium (motor only)
    pub fn tp(&self) -> Option<Decimal> {
        match self {
            PolicyPremium::Motor(m) => m.tp,
            PolicyPremium::Standard(_) => None,
        }
    }

    /// Returns true for the motor shape
    pub fn is_motor(&self) -> bool {
        matches!(self, PolicyPremium::Motor(_))
    }

    /// Net premium when keyed and positive
    pub fn positive_net(&self) -> Option<Decimal> {
        self.net().filter(|n| *n > Decimal::ZERO)
    }

    /// The amount a rule tier is selected on and a single rate is applied to
    ///
    /// Other lines use the net premium whenever it is keyed, zero included,
    /// and fall back to gross only when it is absent. Motor only rates on
    /// net when it is positive, so a zero net selects the tier on gross.
    pub fn rating_base(&self) -> Decimal {
        match self {
            PolicyPremium::Standard(s) => s.net.unwrap_or(s.total),
            PolicyPremium::Motor(m) => self.positive_net().unwrap_or(m.total),
        }
    }

    /// Validates the premium facts
    ///
    /// # Errors
    ///
    /// - any keyed amount is negative
    /// - a motor cover is missing a component it requires
    pub fn validate(&self) -> Result<(), CommissionError> {
        let keyed = [
            ("total", Some(self.total())),
            ("net", self.net()),
            ("od", self.od()),
            ("tp", self.tp()),
        ];
        for (field, value) in keyed {
            if let Some(v) = value {
                if v < Decimal::ZERO {
                    return Err(CommissionError::invalid_premium(format!(
                        "{} premium must not be negative, got {}",
                        field, v
                    )));
                }
            }
        }

        if let PolicyPremium::Motor(m) = self {
            if m.cover.requires_od() && m.od.is_none() {
                return Err(CommissionError::invalid_premium(format!(
                    "{} motor cover requires an OD premium",
                    m.cover.code()
                )));
            }
            if m.cover.requires_tp() && m.tp.is_none() {
                return Err(CommissionError::invalid_premium(format!(
                    "{} motor cover requires a TP premium",
                    m.cover.code()
                )));
            }
        }

        Ok(())
    }
}

impl From<MotorPremium> for PolicyPremium {
    fn from(value: MotorPremium) -> Self {
        PolicyPremium::Motor(value)
    }
}

impl From<StandardPremium> for PolicyPremium {
    fn from(value: StandardPremium) -> Self {
        PolicyPremium::Standard(value)
    }
}
