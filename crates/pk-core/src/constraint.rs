//! Placement constraints between sibling components

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt;

use glam::DVec3;
use pk_kernel::{BoundingBox, Transform};
use serde::{Deserialize, Serialize};

use crate::constants::ORIGIN_MATE;

/// A mate on a named sibling (`None` is the component's origin)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MateRef {
    pub component: String,
    pub mate: Option<String>,
}

impl MateRef {
    pub fn origin(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            mate: None,
        }
    }

    pub fn new(component: impl Into<String>, mate: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            mate: Some(mate.into()),
        }
    }

    pub fn mate_name(&self) -> &str {
        self.mate.as_deref().unwrap_or(ORIGIN_MATE)
    }
}

impl From<&str> for MateRef {
    fn from(component: &str) -> Self {
        MateRef::origin(component)
    }
}

impl From<(&str, &str)> for MateRef {
    fn from((component, mate): (&str, &str)) -> Self {
        MateRef::new(component, mate)
    }
}

impl fmt::Display for MateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.mate {
            Some(mate) => write!(f, "{}.{}", self.component, mate),
            None => f.write_str(&self.component),
        }
    }
}

/// A face of a component's bounding box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoxFace {
    /// +Z
    Top,
    /// -Z
    Bottom,
    /// +X
    Right,
    /// -X
    Left,
    /// +Y
    Back,
    /// -Y
    Front,
}

impl BoxFace {
    /// Frame at the face center with +Z along the outward normal
    pub fn frame(&self, bounds: &BoundingBox) -> Transform {
        let c = bounds.center();
        let (min, max) = (bounds.min, bounds.max);
        let (origin, rotation) = match self {
            BoxFace::Top => (DVec3::new(c.x, c.y, max.z), Transform::IDENTITY),
            BoxFace::Bottom => (DVec3::new(c.x, c.y, min.z), Transform::from_axis_angle(DVec3::X, PI)),
            BoxFace::Right => (DVec3::new(max.x, c.y, c.z), Transform::from_axis_angle(DVec3::Y, FRAC_PI_2)),
            BoxFace::Left => (DVec3::new(min.x, c.y, c.z), Transform::from_axis_angle(DVec3::Y, -FRAC_PI_2)),
            BoxFace::Back => (DVec3::new(c.x, max.y, c.z), Transform::from_axis_angle(DVec3::X, -FRAC_PI_2)),
            BoxFace::Front => (DVec3::new(c.x, min.y, c.z), Transform::from_axis_angle(DVec3::X, FRAC_PI_2)),
        };
        Transform::from_translation(origin) * rotation
    }
}

/// A rule placing one child (the target) inside its assembly
///
/// Each constraint places exactly one target. Dependencies point from the
/// referenced sibling to the target and must form a DAG.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Constraint {
    /// Put the target's mate at a fixed frame of the assembly
    Fixed { target: MateRef, at: Transform },

    /// Put the target's mate at another sibling's mate, then `offset`
    Coincident {
        target: MateRef,
        to: MateRef,
        offset: Transform,
    },

    /// Put the target's mate on a bounding-box face of a built sibling
    ///
    /// Depends on the sibling's geometry, not just its placement.
    OnFace {
        target: MateRef,
        to: String,
        face: BoxFace,
        offset: Transform,
    },
}

impl Constraint {
    pub fn fixed(target: impl Into<MateRef>, at: Transform) -> Self {
        Constraint::Fixed {
            target: target.into(),
            at,
        }
    }

    pub fn coincident(target: impl Into<MateRef>, to: impl Into<MateRef>, offset: Transform) -> Self {
        Constraint::Coincident {
            target: target.into(),
            to: to.into(),
            offset,
        }
    }

    /// Coincident with a pure translation offset
    pub fn attach(target: impl Into<MateRef>, to: impl Into<MateRef>, offset: DVec3) -> Self {
        Self::coincident(target, to, Transform::from_translation(offset))
    }

    /// Target mate faces the anchor mate (Z axes opposed), `gap` apart
    pub fn face_to_face(target: impl Into<MateRef>, to: impl Into<MateRef>, gap: f64) -> Self {
        let offset = Transform::from_xyz(0.0, 0.0, gap) * Transform::from_axis_angle(DVec3::X, PI);
        Self::coincident(target, to, offset)
    }

    pub fn on_face(target: impl Into<MateRef>, to: impl Into<String>, face: BoxFace, offset: Transform) -> Self {
        Constraint::OnFace {
            target: target.into(),
            to: to.into(),
            face,
            offset,
        }
    }

    pub fn target(&self) -> &MateRef {
        match self {
            Constraint::Fixed { target, .. }
            | Constraint::Coincident { target, .. }
            | Constraint::OnFace { target, .. } => target,
        }
    }

    /// Sibling this constraint reads from, if any
    pub fn dependency(&self) -> Option<&str> {
        match self {
            Constraint::Fixed { .. } => None,
            Constraint::Coincident { to, .. } => Some(&to.component),
            Constraint::OnFace { to, .. } => Some(to),
        }
    }

    /// Sibling whose built geometry this constraint reads
    pub fn geometry_dependency(&self) -> Option<&str> {
        match self {
            Constraint::OnFace { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Constraint::Fixed { .. } => "Fixed",
            Constraint::Coincident { .. } => "Coincident",
            Constraint::OnFace { .. } => "OnFace",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Fixed { target, .. } => write!(f, "Fixed({target})"),
            Constraint::Coincident { target, to, .. } => write!(f, "Coincident({target} -> {to})"),
            Constraint::OnFace { target, to, face, .. } => {
                write!(f, "OnFace({target} -> {to}:{face:?})")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_face_frames_point_outward() {
        let bounds = BoundingBox::new(DVec3::new(-1.0, -2.0, 0.0), DVec3::new(1.0, 2.0, 6.0));
        let cases = [
            (BoxFace::Top, DVec3::new(0.0, 0.0, 6.0), DVec3::Z),
            (BoxFace::Bottom, DVec3::new(0.0, 0.0, 0.0), DVec3::NEG_Z),
            (BoxFace::Right, DVec3::new(1.0, 0.0, 3.0), DVec3::X),
            (BoxFace::Left, DVec3::new(-1.0, 0.0, 3.0), DVec3::NEG_X),
            (BoxFace::Back, DVec3::new(0.0, 2.0, 3.0), DVec3::Y),
            (BoxFace::Front, DVec3::new(0.0, -2.0, 3.0), DVec3::NEG_Y),
        ];
        for (face, origin, normal) in cases {
            let frame = face.frame(&bounds);
            assert!(frame.translation.abs_diff_eq(origin, 1e-12), "{face:?}");
            assert!(frame.transform_vector(DVec3::Z).abs_diff_eq(normal, 1e-12), "{face:?}");
        }
    }

    #[test]
    fn test_face_to_face_opposes_z() {
        let Constraint::Coincident { offset, .. } = Constraint::face_to_face("a", ("b", "top"), 2.0) else {
            panic!("expected coincident");
        };
        assert_abs_diff_eq!(offset.translation.z, 2.0);
        assert!(offset.transform_vector(DVec3::Z).abs_diff_eq(DVec3::NEG_Z, 1e-12));
    }

    #[test]
    fn test_dependencies() {
        let fixed = Constraint::fixed("a", Transform::IDENTITY);
        let coincident = Constraint::attach(("b", "bottom"), ("a", "top"), DVec3::Z);
        let on_face = Constraint::on_face("c", "b", BoxFace::Top, Transform::IDENTITY);

        assert_eq!(fixed.dependency(), None);
        assert_eq!(coincident.dependency(), Some("a"));
        assert_eq!(coincident.target().mate_name(), "bottom");
        assert_eq!(on_face.dependency(), Some("b"));
        assert_eq!(on_face.geometry_dependency(), Some("b"));
        assert_eq!(coincident.geometry_dependency(), None);
        assert_eq!(fixed.target().mate_name(), "origin");
    }

    #[test]
    fn test_display() {
        let c = Constraint::attach(("b", "bottom"), ("a", "top"), DVec3::Z);
        assert_eq!(c.to_string(), "Coincident(b.bottom -> a.top)");
    }

    #[test]
    fn test_ron_round_trip() {
        let c = Constraint::on_face("c", "b", BoxFace::Right, Transform::from_xyz(0.0, 0.0, 1.0));
        let text = ron::to_string(&c).unwrap();
        let back: Constraint = ron::from_str(&text).unwrap();
        assert_eq!(back, c);
    }
}
