#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

pub trait Layer {
    fn id(&self) -> LayerId;

    /// Layers with a lower z draw first.
    fn z_index(&self) -> i32 {
        0
    }
}

/// Ids in the order the renderer should draw them. Equal z keeps input order.
pub fn draw_order(layers: &[&dyn Layer]) -> Vec<LayerId> {
    let mut sorted = layers.to_vec();
    sorted.sort_by_key(|layer| layer.z_index());
    sorted.into_iter().map(|layer| layer.id()).collect()
}

#[cfg(test)]
mod tests {
    use super::{Layer, LayerId, draw_order};
    use pretty_assertions::assert_eq;

    struct Fixed(u64, i32);

    impl Layer for Fixed {
        fn id(&self) -> LayerId {
            LayerId(self.0)
        }

        fn z_index(&self) -> i32 {
            self.1
        }
    }

    #[test]
    fn lower_z_draws_first_and_ties_are_stable() {
        let (a, b, c) = (Fixed(1, 10), Fixed(2, 0), Fixed(3, 0));
        assert_eq!(
            draw_order(&[&a, &b, &c]),
            vec![LayerId(2), LayerId(3), LayerId(1)]
        );
    }
}
