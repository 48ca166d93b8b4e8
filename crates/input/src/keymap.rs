use crate::action::Action;
use cubehost_common::{FaceLayout, InputCode};
use std::collections::BTreeMap;

/// Single-character key bindings.
///
/// Bindings are case-sensitive: `W` is not `w`.
#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: BTreeMap<char, Action>,
}

impl KeyMap {
    /// Build the standard bindings for the given face layout.
    pub fn new(layout: FaceLayout) -> Self {
        let mut bindings = BTreeMap::new();

        bindings.insert('w', Action::Orient(InputCode::PitchUp));
        bindings.insert('a', Action::Orient(InputCode::YawLeft));
        bindings.insert('s', Action::Orient(InputCode::PitchDown));
        bindings.insert('d', Action::Orient(InputCode::YawRight));
        bindings.insert('j', Action::Orient(InputCode::RollForward));
        bindings.insert('k', Action::Orient(InputCode::RollBack));

        bindings.insert(',', Action::StepSelection(-1));
        bindings.insert('.', Action::StepSelection(1));
        bindings.insert('/', Action::StepSelection(9));

        for face in 0..layout.face_count() {
            let key = char::from(b'1' + face);
            bindings.insert(key, Action::SelectFace(face));
        }

        bindings.insert('r', Action::Rotate);
        bindings.insert('o', Action::NudgeAngle(-1));
        bindings.insert('p', Action::NudgeAngle(1));

        Self { bindings }
    }

    /// Action for a typed character.
    pub fn action_for(&self, key: char) -> Action {
        match self.bindings.get(&key) {
            Some(action) => *action,
            None => {
                tracing::trace!(?key, "unmapped key");
                Action::Noop
            }
        }
    }

    /// Action for the text a window backend reports for a key press.
    ///
    /// Only single-character keys can be bound.
    pub fn action_for_text(&self, text: &str) -> Action {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.action_for(c),
            _ => Action::Noop,
        }
    }

    /// Translate a key script into actions, one per non-whitespace character.
    pub fn parse_script(&self, script: &str) -> Vec<Action> {
        script
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| self.action_for(c))
            .collect()
    }

    /// All bound keys in character order.
    pub fn bindings(&self) -> impl Iterator<Item = (char, &Action)> {
        self.bindings.iter().map(|(k, a)| (*k, a))
    }
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new(FaceLayout::default())
    }
}
