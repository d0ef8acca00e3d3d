//! Labeled 2-D samples.
//!
//! A `Dataset` keeps its samples in file order and, separately, a permutation
//! of their indices. Training walks the permutation, which is reshuffled once
//! per epoch; the samples themselves never move.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::{Error, Result};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Binary class of a sample.
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    /// Map a `{0, 1}` class id onto a label.
    pub fn from_class(class: u8) -> Result<Self> {
        match class {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            other => Err(Error::InvalidData(format!(
                "class must be 0 or 1, got {other}"
            ))),
        }
    }

    /// Training target, `2 * class - 1`.
    #[inline]
    pub fn target(self) -> f64 {
        match self {
            Label::Negative => -1.0,
            Label::Positive => 1.0,
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub x: f32,
    pub y: f32,
    pub label: Label,
}

impl Sample {
    #[inline]
    pub fn new(x: f32, y: f32, label: Label) -> Self {
        Self { x, y, label }
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.label.target()
    }

    /// Parse a `x<TAB>y<TAB>class` line.
    pub fn parse_line(line: &str) -> Result<Self> {
        let mut fields = line.split_whitespace();
        let (Some(x), Some(y), Some(class), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(Error::InvalidData(format!(
                "expected `x y class`, got {line:?}"
            )));
        };

        let x: f32 = x
            .parse()
            .map_err(|e| Error::InvalidData(format!("bad x {x:?}: {e}")))?;
        let y: f32 = y
            .parse()
            .map_err(|e| Error::InvalidData(format!("bad y {y:?}: {e}")))?;
        let class: u8 = class
            .parse()
            .map_err(|e| Error::InvalidData(format!("bad class {class:?}: {e}")))?;

        Ok(Self::new(x, y, Label::from_class(class)?))
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    samples: Vec<Sample>,
    order: Vec<usize>,
}

impl Dataset {
    /// Wrap samples; the permutation starts as the identity.
    pub fn from_samples(samples: Vec<Sample>) -> Self {
        let order = (0..samples.len()).collect();
        Self { samples, order }
    }

    /// Read samples until the first line that does not parse.
    ///
    /// Blank lines are skipped. A malformed line (including one that is not
    /// UTF-8) ends the dataset; it is not an error. Only a failing reader is
    /// reported.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut samples = Vec::new();
        for (lineno, line) in reader.split(b'\n').enumerate() {
            let bytes = line
                .map_err(|e| Error::InvalidData(format!("failed to read line {}: {e}", lineno + 1)))?;
            let Ok(line) = std::str::from_utf8(&bytes) else {
                warn!("stopped reading samples at line {}: not valid UTF-8", lineno + 1);
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            match Sample::parse_line(line) {
                Ok(sample) => samples.push(sample),
                Err(e) => {
                    warn!("stopped reading samples at line {}: {e}", lineno + 1);
                    break;
                }
            }
        }
        Ok(Self::from_samples(samples))
    }

    /// Load a dataset file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let f = File::open(p)
            .map_err(|e| Error::InvalidData(format!("failed to open {}: {e}", p.display())))?;
        Self::parse(BufReader::new(f))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Samples in insertion (file) order.
    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Current permutation of sample indices.
    #[inline]
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// The `pos`-th sample of the current permutation.
    ///
    /// Panics if `pos >= len`.
    #[inline]
    pub fn shuffled(&self, pos: usize) -> &Sample {
        &self.samples[self.order[pos]]
    }

    /// Reshuffle the permutation in place.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.order.shuffle(rng);
    }
}
