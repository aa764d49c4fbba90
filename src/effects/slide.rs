use std::str::FromStr;

use crate::dom::{Dom, NodeId};
use crate::scheduler::{Animation, StepOutcome};
use crate::{Error, Result};

/// Side the element slides in from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Left,
    Right,
    Up,
    Down,
}

impl SlideDirection {
    /// Inline style property carrying the offset.
    pub fn property(&self) -> &'static str {
        match self {
            Self::Left | Self::Right => "left",
            Self::Up | Self::Down => "top",
        }
    }

    fn sign(&self) -> f64 {
        match self {
            Self::Left | Self::Up => -1.0,
            Self::Right | Self::Down => 1.0,
        }
    }
}

impl FromStr for SlideDirection {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "up" | "top" => Ok(Self::Up),
            "down" | "bottom" => Ok(Self::Down),
            other => Err(Error::Runtime(format!("unknown slide direction: {other}"))),
        }
    }
}

/// Moves an element from `offset` pixels away back to its natural position.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideAnimation {
    element: NodeId,
    direction: SlideDirection,
    remaining: f64,
    step_px: f64,
}

impl SlideAnimation {
    pub fn new(element: NodeId, offset: f64, direction: SlideDirection, step_px: f64) -> Self {
        Self {
            element,
            direction,
            remaining: offset.abs(),
            step_px: step_px.abs().max(f64::EPSILON),
        }
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    fn apply_offset(&self, dom: &mut Dom) -> Result<()> {
        let offset = self.direction.sign() * self.remaining;
        dom.set_style_property(self.element, self.direction.property(), &format!("{offset}px"))
    }
}

impl Animation for SlideAnimation {
    fn prepare(&mut self, dom: &mut Dom) -> Result<()> {
        dom.set_style_property(self.element, "position", "relative")?;
        self.apply_offset(dom)
    }

    fn step(&mut self, dom: &mut Dom) -> Result<StepOutcome> {
        self.remaining = (self.remaining - self.step_px).max(0.0);
        if self.remaining > 0.0 {
            self.apply_offset(dom)?;
            return Ok(StepOutcome::Continue);
        }
        // hand layout back to the stylesheet
        dom.remove_style_property(self.element, "position")?;
        dom.remove_style_property(self.element, self.direction.property())?;
        Ok(StepOutcome::Finished)
    }

    fn name(&self) -> &'static str {
        "slide"
    }
}
