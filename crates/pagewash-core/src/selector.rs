// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sheet selectors and the per-sheet stage enablement policy.
//
// A selector names a set of sheet numbers: every sheet, no sheet, or an
// explicit list written as "1,3,5-7". The policy combines the selectors for
// the sheet range, exclusions, the no-processing list, and the per-feature
// disable lists.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PagewashError;

/// A set of sheet numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SheetSelector {
    /// Every sheet.
    All,
    /// No sheet.
    #[default]
    None,
    /// Exactly the listed sheets.
    Explicit(BTreeSet<u32>),
}

impl SheetSelector {
    pub fn contains(&self, sheet: u32) -> bool {
        match self {
            SheetSelector::All => true,
            SheetSelector::None => false,
            SheetSelector::Explicit(sheets) => sheets.contains(&sheet),
        }
    }

    pub fn is_none(&self) -> bool {
        match self {
            SheetSelector::None => true,
            SheetSelector::Explicit(sheets) => sheets.is_empty(),
            SheetSelector::All => false,
        }
    }
}

impl FromStr for SheetSelector {
    type Err = PagewashError;

    /// Parse `"all"`, `"none"`, or a list such as `"1,3,5-7"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "all" => return Ok(SheetSelector::All),
            "none" => return Ok(SheetSelector::None),
            "" => {
                return Err(PagewashError::Config("empty sheet list".into()));
            }
            _ => {}
        }

        let invalid = || PagewashError::Config(format!("invalid sheet list '{s}'"));
        let mut sheets = BTreeSet::new();
        for part in trimmed.split(',') {
            let part = part.trim();
            match part.split_once('-') {
                Some((first, last)) => {
                    let first: u32 = first.trim().parse().map_err(|_| invalid())?;
                    let last: u32 = last.trim().parse().map_err(|_| invalid())?;
                    if first > last {
                        return Err(invalid());
                    }
                    sheets.extend(first..=last);
                }
                None => {
                    sheets.insert(part.parse().map_err(|_| invalid())?);
                }
            }
        }
        Ok(SheetSelector::Explicit(sheets))
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::All => write!(f, "all"),
            SheetSelector::None => write!(f, "none"),
            SheetSelector::Explicit(sheets) => {
                let list: Vec<String> = sheets.iter().map(u32::to_string).collect();
                write!(f, "{}", list.join(","))
            }
        }
    }
}

/// Processing stages that can be switched off for selected sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    BlackFilter,
    NoiseFilter,
    BlurFilter,
    GrayFilter,
    MaskScan,
    MaskCenter,
    Deskew,
    Wipe,
    Border,
    BorderScan,
    BorderCenter,
}

impl Feature {
    pub const ALL: [Feature; 11] = [
        Feature::BlackFilter,
        Feature::NoiseFilter,
        Feature::BlurFilter,
        Feature::GrayFilter,
        Feature::MaskScan,
        Feature::MaskCenter,
        Feature::Deskew,
        Feature::Wipe,
        Feature::Border,
        Feature::BorderScan,
        Feature::BorderCenter,
    ];

    /// Name used in `--no-<name>` options and log fields.
    pub fn name(self) -> &'static str {
        match self {
            Feature::BlackFilter => "blackfilter",
            Feature::NoiseFilter => "noisefilter",
            Feature::BlurFilter => "blurfilter",
            Feature::GrayFilter => "grayfilter",
            Feature::MaskScan => "mask-scan",
            Feature::MaskCenter => "mask-center",
            Feature::Deskew => "deskew",
            Feature::Wipe => "wipe",
            Feature::Border => "border",
            Feature::BorderScan => "border-scan",
            Feature::BorderCenter => "border-center",
        }
    }
}

/// Which sheets are processed, and which stages run on each of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetPolicy {
    /// Sheets to process at all.
    pub sheets: SheetSelector,
    /// Sheets skipped entirely (no output written).
    pub exclude: SheetSelector,
    /// Sheets passed through with only pre/post rotation and mirroring.
    pub ignore: SheetSelector,
    /// Per-feature disable lists.
    pub disabled: BTreeMap<Feature, SheetSelector>,
}

impl Default for SheetPolicy {
    fn default() -> Self {
        Self {
            sheets: SheetSelector::All,
            exclude: SheetSelector::None,
            ignore: SheetSelector::None,
            disabled: BTreeMap::new(),
        }
    }
}

impl SheetPolicy {
    /// Set the exclusion list. Excluding every sheet would make the run a
    /// no-op, so `all` is read as "nothing excluded".
    pub fn set_exclude(&mut self, exclude: SheetSelector) {
        self.exclude = match exclude {
            SheetSelector::All => SheetSelector::None,
            other => other,
        };
    }

    /// Switch `feature` off for the sheets in `selector`.
    pub fn disable(&mut self, feature: Feature, selector: SheetSelector) {
        self.disabled.insert(feature, selector);
    }

    /// Whether `sheet` is processed and written at all.
    pub fn processes(&self, sheet: u32) -> bool {
        self.sheets.contains(sheet) && !self.exclude.contains(sheet)
    }

    /// Whether `sheet` gets the full processing pipeline.
    pub fn is_ignored(&self, sheet: u32) -> bool {
        self.ignore.contains(sheet)
    }

    /// Whether `feature` runs on `sheet`.
    pub fn enabled(&self, feature: Feature, sheet: u32) -> bool {
        if self.is_ignored(sheet) {
            return false;
        }
        !self
            .disabled
            .get(&feature)
            .is_some_and(|selector| selector.contains(sheet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Lists mix single sheets and inclusive ranges.
    #[test]
    fn parse_list_with_ranges() {
        let selector: SheetSelector = "1,3,5-7".parse().expect("valid list");
        for sheet in [1, 3, 5, 6, 7] {
            assert!(selector.contains(sheet), "sheet {sheet} should be selected");
        }
        for sheet in [2, 4, 8] {
            assert!(!selector.contains(sheet), "sheet {sheet} should not be selected");
        }
        assert_eq!(selector.to_string(), "1,3,5,6,7");
    }

    /// `all` and `none` are keywords, and malformed lists are rejected.
    #[test]
    fn parse_keywords_and_errors() {
        assert_eq!("ALL".parse::<SheetSelector>().expect("all"), SheetSelector::All);
        assert!("none".parse::<SheetSelector>().expect("none").is_none());
        assert!("".parse::<SheetSelector>().is_err());
        assert!("3-1".parse::<SheetSelector>().is_err());
        assert!("1,x".parse::<SheetSelector>().is_err());
    }

    /// Excluded sheets are not processed; excluding all means excluding none.
    #[test]
    fn exclusion_rules() {
        let mut policy = SheetPolicy::default();
        policy.set_exclude("2".parse().expect("list"));
        assert!(policy.processes(1));
        assert!(!policy.processes(2));

        policy.set_exclude(SheetSelector::All);
        assert!(policy.processes(2));
    }

    /// A feature is off when disabled for the sheet or when the sheet is ignored.
    #[test]
    fn feature_enablement() {
        let mut policy = SheetPolicy::default();
        policy.disable(Feature::Deskew, "3".parse().expect("list"));
        policy.ignore = "5".parse().expect("list");

        assert!(policy.enabled(Feature::Deskew, 1));
        assert!(!policy.enabled(Feature::Deskew, 3));
        assert!(policy.enabled(Feature::NoiseFilter, 3));
        assert!(!policy.enabled(Feature::NoiseFilter, 5));
        assert!(policy.processes(5));
    }

    /// The disable map survives a JSON round trip with string keys.
    #[test]
    fn policy_serializes_to_json() {
        let mut policy = SheetPolicy::default();
        policy.disable(Feature::BlurFilter, SheetSelector::All);
        let json = serde_json::to_string(&policy).expect("serialize");
        assert!(json.contains("blur-filter"));
        let back: SheetPolicy = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, policy);
    }
}
