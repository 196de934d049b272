//! Draw-order sorting of alive particles

use crate::particle::Particle;
use std::cmp::Ordering;

/// Particle field the alive list can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortProperty {
    X,
    Y,
    ScaleX,
    ScaleY,
    Angle,
    Alpha,
    LifeCurrent,
    LifeT,
    Index,
}

impl SortProperty {
    pub const ALL: [Self; 9] = [
        Self::X,
        Self::Y,
        Self::ScaleX,
        Self::ScaleY,
        Self::Angle,
        Self::Alpha,
        Self::LifeCurrent,
        Self::LifeT,
        Self::Index,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::ScaleX => "scaleX",
            Self::ScaleY => "scaleY",
            Self::Angle => "angle",
            Self::Alpha => "alpha",
            Self::LifeCurrent => "lifeCurrent",
            Self::LifeT => "lifeT",
            Self::Index => "index",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    pub fn value(self, particle: &Particle) -> f32 {
        match self {
            Self::X => particle.pos.x,
            Self::Y => particle.pos.y,
            Self::ScaleX => particle.scale_x,
            Self::ScaleY => particle.scale_y,
            Self::Angle => particle.angle,
            Self::Alpha => particle.alpha,
            Self::LifeCurrent => particle.life_current,
            Self::LifeT => particle.life_t,
            Self::Index => particle.index as f32,
        }
    }

    pub fn compare(self, a: &Particle, b: &Particle, ascending: bool) -> Ordering {
        let order = self.value(a).total_cmp(&self.value(b));
        if ascending {
            order
        } else {
            order.reverse()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for prop in SortProperty::ALL {
            assert_eq!(SortProperty::from_name(prop.as_str()), Some(prop));
        }
        assert_eq!(SortProperty::from_name("depth"), None);
    }

    #[test]
    fn test_compare_direction() {
        let mut a = Particle::new();
        let mut b = Particle::new();
        a.pos.y = 1.0;
        b.pos.y = 2.0;
        assert_eq!(SortProperty::Y.compare(&a, &b, true), Ordering::Less);
        assert_eq!(SortProperty::Y.compare(&a, &b, false), Ordering::Greater);
        assert_eq!(SortProperty::X.compare(&a, &b, true), Ordering::Equal);
    }
}
