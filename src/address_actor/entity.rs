use chrono::Utc;

use super::actions::AddressAction;
use crate::actor_framework::Entity;
use crate::domain::{AddressCreate, AddressPatch, CustomerAddress};

impl Entity for CustomerAddress {
    type Id = String;
    type CreateParams = AddressCreate;
    type Patch = AddressPatch;
    type Action = AddressAction;
    type ActionResult = bool;

    fn id(&self) -> &String {
        &self.id
    }

    fn from_create_params(id: String, params: AddressCreate) -> Result<Self, String> {
        let now = Utc::now();
        Ok(Self {
            id,
            user_id: params.user_id,
            label: params.label,
            address: params.address,
            is_default: params.is_default,
            created_at: now,
            updated_at: now,
        })
    }

    /// Applies the provided fields. Unsetting other defaults is the caller's job.
    fn on_update(&mut self, patch: AddressPatch) -> Result<(), String> {
        if let Some(label) = patch.label {
            self.label = Some(label);
        }
        if let Some(address) = patch.address {
            self.address = address;
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    fn handle_action(&mut self, action: AddressAction) -> Result<bool, String> {
        match action {
            AddressAction::ClearDefault => {
                let was_default = self.is_default;
                if was_default {
                    self.is_default = false;
                    self.updated_at = Utc::now();
                }
                Ok(was_default)
            }
        }
    }
}
