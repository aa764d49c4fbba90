use crate::dom::{Dom, NodeId};
use crate::{Error, Result};

pub const SOURCE_SELECT_ID: &str = "id_marketing_source";
pub const BANK_WRAPPER_ID: &str = "marketing_source_bank";
pub const BANK_INPUT_ID: &str = "id_marketing_source_bank";
pub const OTHER_WRAPPER_ID: &str = "marketing_source_other";
pub const OTHER_INPUT_ID: &str = "id_marketing_source_other";

pub const FORM_GROUP_VISIBLE: &str = "form-group";
pub const FORM_GROUP_HIDDEN: &str = "form-group hidden";

const BANK: &str = "Bank";
const OTHER: &str = "other";

/// The "how did you hear about us" select and its two free-text follow-ups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketingSource {
    pub(crate) select: NodeId,
    bank_wrapper: NodeId,
    bank_input: NodeId,
    other_wrapper: NodeId,
    other_input: NodeId,
}

impl MarketingSource {
    /// Locates the fields by id. `Ok(None)` when the select is absent.
    pub(crate) fn locate(dom: &Dom) -> Result<Option<Self>> {
        let Some(select) = dom.by_id(SOURCE_SELECT_ID) else {
            return Ok(None);
        };
        let find = |id: &str| {
            dom.by_id(id)
                .ok_or_else(|| Error::SelectorNotFound(format!("#{id}")))
        };
        Ok(Some(Self {
            select,
            bank_wrapper: find(BANK_WRAPPER_ID)?,
            bank_input: find(BANK_INPUT_ID)?,
            other_wrapper: find(OTHER_WRAPPER_ID)?,
            other_input: find(OTHER_INPUT_ID)?,
        }))
    }

    /// Shows the follow-up field matching the selected source and clears
    /// the hidden one.
    pub(crate) fn update(&self, dom: &mut Dom) -> Result<()> {
        let value = dom.value(self.select)?;
        let (show_bank, show_other) = match value.as_str() {
            BANK => (true, false),
            OTHER => (false, true),
            _ => (false, false),
        };

        for (wrapper, input, shown) in [
            (self.bank_wrapper, self.bank_input, show_bank),
            (self.other_wrapper, self.other_input, show_other),
        ] {
            if shown {
                dom.set_class_name(wrapper, FORM_GROUP_VISIBLE)?;
            } else {
                dom.set_class_name(wrapper, FORM_GROUP_HIDDEN)?;
                dom.set_value(input, "")?;
            }
        }
        Ok(())
    }
}
