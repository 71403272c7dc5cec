use chrono::Utc;

use crate::actor_framework::Entity;
use crate::domain::{CartItem, CartSnapshot};

impl Entity for CartSnapshot {
    type Id = String;
    type CreateParams = CartSnapshot;
    type Patch = Vec<CartItem>;
    type Action = ();
    type ActionResult = ();

    fn id(&self) -> &String {
        &self.user_id
    }

    /// Snapshots are keyed by user id, so the generated id is ignored.
    fn from_create_params(_id: String, params: CartSnapshot) -> Result<Self, String> {
        Ok(params)
    }

    /// Replaces the stored lines wholesale.
    fn on_update(&mut self, items: Vec<CartItem>) -> Result<(), String> {
        self.items = items;
        self.updated_at = Utc::now();
        Ok(())
    }

    fn handle_action(&mut self, _action: ()) -> Result<(), String> {
        Ok(())
    }
}
