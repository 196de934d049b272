//! Texture frame and animation name selection

use crate::util::Rng;
use serde::{Deserialize, Serialize};

fn one() -> usize {
    1
}

/// Serialized frame or animation selection: a single name, a list picked
/// at random, or a list with explicit cycling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FrameConfig {
    Name(String),
    List(Vec<String>),
    Detailed {
        #[serde(alias = "anims")]
        frames: Vec<String>,
        #[serde(default)]
        cycle: bool,
        #[serde(default = "one")]
        quantity: usize,
    },
}

/// Hands out a name per fired particle.
///
/// Sequential selection stays on one name for `quantity` particles before
/// moving to the next, wrapping at the end of the list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameSelector {
    names: Vec<String>,
    random: bool,
    quantity: usize,
    current: usize,
    counter: usize,
}

impl FrameSelector {
    pub fn new(names: Vec<String>, pick_random: bool, quantity: usize) -> Self {
        // A single name has nothing to pick between
        let single = names.len() == 1;
        Self {
            names,
            random: pick_random && !single,
            quantity: if single { 1 } else { quantity.max(1) },
            current: 0,
            counter: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_random(&self) -> bool {
        self.random
    }

    pub fn quantity(&self) -> usize {
        self.quantity
    }

    /// Name for the next particle, or `None` when no names are set
    pub fn next(&mut self, rng: &mut Rng) -> Option<String> {
        let len = self.names.len();
        let index = match len {
            0 => return None,
            1 => 0,
            _ if self.random => rng.index(len),
            _ => {
                let index = self.current;
                self.counter += 1;
                if self.counter >= self.quantity {
                    self.counter = 0;
                    self.current = (self.current + 1) % len;
                }
                index
            }
        };
        self.names.get(index).cloned()
    }

    pub fn reset_counter(&mut self) {
        self.counter = 0;
    }

    pub fn config(&self) -> Option<FrameConfig> {
        match self.names.len() {
            0 => None,
            1 => Some(FrameConfig::Name(self.names[0].clone())),
            _ if self.random && self.quantity == 1 => Some(FrameConfig::List(self.names.clone())),
            _ => Some(FrameConfig::Detailed {
                frames: self.names.clone(),
                cycle: !self.random,
                quantity: self.quantity,
            }),
        }
    }
}

impl From<FrameConfig> for FrameSelector {
    fn from(config: FrameConfig) -> Self {
        match config {
            FrameConfig::Name(name) => Self::new(vec![name], false, 1),
            FrameConfig::List(names) => Self::new(names, true, 1),
            FrameConfig::Detailed {
                frames,
                cycle,
                quantity,
            } => Self::new(frames, !cycle, quantity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_sequential_advances_after_quantity() {
        let mut sel = FrameSelector::new(names(&["a", "b", "c"]), false, 2);
        let mut rng = Rng::new(1);
        let picked: Vec<_> = (0..7).filter_map(|_| sel.next(&mut rng)).collect();
        assert_eq!(picked, names(&["a", "a", "b", "b", "c", "c", "a"]));
    }

    #[test]
    fn test_single_name_forces_sequential() {
        let sel = FrameSelector::new(names(&["spark"]), true, 5);
        assert!(!sel.is_random());
        assert_eq!(sel.quantity(), 1);
        assert_eq!(sel.config(), Some(FrameConfig::Name("spark".into())));
    }

    #[test]
    fn test_random_stays_in_list() {
        let mut sel = FrameSelector::new(names(&["a", "b"]), true, 1);
        let mut rng = Rng::new(3);
        for _ in 0..20 {
            let name = sel.next(&mut rng).unwrap();
            assert!(name == "a" || name == "b");
        }
    }

    #[test]
    fn test_empty_selector() {
        let mut sel = FrameSelector::default();
        assert!(sel.next(&mut Rng::new(1)).is_none());
        assert!(sel.config().is_none());
    }

    #[test]
    fn test_config_forms() {
        let list: FrameConfig = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert!(FrameSelector::from(list).is_random());

        let detailed: FrameConfig =
            serde_json::from_value(json!({"anims": ["x", "y"], "cycle": true, "quantity": 3}))
                .unwrap();
        let sel = FrameSelector::from(detailed.clone());
        assert!(!sel.is_random());
        assert_eq!(sel.quantity(), 3);
        assert_eq!(sel.config(), Some(detailed));
    }
}
