use std::sync::LazyLock;

use fancy_regex::Regex;

use crate::Result;
use crate::dom::{Dom, NodeId};
use crate::scheduler::{Animation, StepOutcome};

static THOUSANDS: LazyLock<std::result::Result<Regex, fancy_regex::Error>> =
    LazyLock::new(|| Regex::new(r"\B(?=(\d{3})+(?!\d))"));

/// `1234567` → `"1,234,567"`. Values below 1000 are unchanged.
pub fn format_grouped(value: u64) -> String {
    let digits = value.to_string();
    if value < 1000 {
        return digits;
    }
    match THOUSANDS.as_ref() {
        Ok(regex) => match regex.try_replacen(&digits, 0, ",") {
            Ok(grouped) => grouped.into_owned(),
            Err(err) => {
                tracing::warn!(error = %err, "thousands grouping failed");
                digits
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "thousands grouping pattern rejected");
            digits
        }
    }
}

/// Counts the element's text up from 1 to `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterAnimation {
    element: NodeId,
    end: u64,
    increment: u64,
    current: u64,
}

impl CounterAnimation {
    /// `frames` is the number of steps the count should take; the per-frame
    /// increment is `ceil(end / frames)`, at least 1.
    pub fn new(element: NodeId, end: u64, frames: u64) -> Self {
        let increment = end.div_ceil(frames.max(1)).max(1);
        Self {
            element,
            end,
            increment,
            current: 0,
        }
    }

    pub fn current(&self) -> u64 {
        self.current
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn increment(&self) -> u64 {
        self.increment
    }

    fn display(&mut self, dom: &mut Dom, value: u64) -> Result<StepOutcome> {
        self.current = value.min(self.end);
        dom.set_text_content(self.element, &format_grouped(self.current))?;
        Ok(if self.current >= self.end {
            StepOutcome::Finished
        } else {
            StepOutcome::Continue
        })
    }
}

impl Animation for CounterAnimation {
    fn start(&mut self, dom: &mut Dom) -> Result<StepOutcome> {
        self.display(dom, 1)
    }

    fn step(&mut self, dom: &mut Dom) -> Result<StepOutcome> {
        let next = self.current.saturating_add(self.increment);
        self.display(dom, next)
    }

    fn name(&self) -> &'static str {
        "counter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_inserts_commas_every_three_digits() {
        assert_eq!(format_grouped(0), "0");
        assert_eq!(format_grouped(999), "999");
        assert_eq!(format_grouped(1000), "1,000");
        assert_eq!(format_grouped(1234), "1,234");
        assert_eq!(format_grouped(1234567), "1,234,567");
    }

    #[test]
    fn counter_snaps_to_end_without_overshooting() -> Result<()> {
        let mut dom = Dom::new();
        let span = dom.create_element(dom.root(), "span", Default::default());
        let mut counter = CounterAnimation::new(span, 1234, 50);
        assert_eq!(counter.increment(), 25);

        assert_eq!(counter.start(&mut dom)?, StepOutcome::Continue);
        assert_eq!(dom.text_content(span), "1");

        let mut frames = 0;
        while counter.step(&mut dom)? == StepOutcome::Continue {
            assert!(counter.current() < 1234);
            frames += 1;
        }
        assert_eq!(frames, 49);
        assert_eq!(dom.text_content(span), "1,234");
        Ok(())
    }

    #[test]
    fn tiny_targets_finish_on_start() -> Result<()> {
        let mut dom = Dom::new();
        let span = dom.create_element(dom.root(), "span", Default::default());
        let mut counter = CounterAnimation::new(span, 1, 50);
        assert_eq!(counter.start(&mut dom)?, StepOutcome::Finished);
        assert_eq!(dom.text_content(span), "1");

        let mut zero = CounterAnimation::new(span, 0, 50);
        assert_eq!(zero.start(&mut dom)?, StepOutcome::Finished);
        assert_eq!(dom.text_content(span), "0");
        Ok(())
    }
}
