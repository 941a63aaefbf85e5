//! Screen rotation applied to the rendered camera image

use glam::Mat4;

const ROTATION_Z0: Mat4 = Mat4::IDENTITY;

const ROTATION_Z90: Mat4 = Mat4::from_cols_array(&[
    0.0, 1.0, 0.0, 0.0, //
    -1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

const ROTATION_Z180: Mat4 = Mat4::from_cols_array(&[
    -1.0, 0.0, 0.0, 0.0, //
    0.0, -1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

const ROTATION_Z270: Mat4 = Mat4::from_cols_array(&[
    0.0, -1.0, 0.0, 0.0, //
    1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
]);

/// Counter-clockwise rotation of the video image relative to the screen.
///
/// The discriminants are the engine's numeric codes, which are not in
/// angle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum RenderRotation {
    #[default]
    Ccw0 = 0,
    Ccw180 = 1,
    Ccw90 = 2,
    Ccw270 = 3,
}

/// Device screen orientation as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScreenOrientation {
    Portrait,
    PortraitUpsideDown,
    LandscapeLeft,
    LandscapeRight,
}

/// Orientation in which a device shows the image unrotated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NaturalOrientation {
    /// Desktop hosts
    #[default]
    Portrait,
    /// Phones, tablets and head-mounted devices
    Landscape,
}

impl RenderRotation {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Ccw0),
            1 => Some(Self::Ccw180),
            2 => Some(Self::Ccw90),
            3 => Some(Self::Ccw270),
            _ => None,
        }
    }

    /// Rotation in degrees, counter-clockwise.
    pub fn degrees(self) -> u32 {
        match self {
            Self::Ccw0 => 0,
            Self::Ccw90 => 90,
            Self::Ccw180 => 180,
            Self::Ccw270 => 270,
        }
    }

    /// How the image has to be rotated to match `orientation` on a device
    /// whose unrotated orientation is `natural`.
    pub fn for_orientation(orientation: ScreenOrientation, natural: NaturalOrientation) -> Self {
        use ScreenOrientation::*;

        match (natural, orientation) {
            (NaturalOrientation::Landscape, LandscapeLeft) => Self::Ccw0,
            (NaturalOrientation::Landscape, PortraitUpsideDown) => Self::Ccw90,
            (NaturalOrientation::Landscape, LandscapeRight) => Self::Ccw180,
            (NaturalOrientation::Landscape, Portrait) => Self::Ccw270,
            (NaturalOrientation::Portrait, Portrait) => Self::Ccw0,
            (NaturalOrientation::Portrait, LandscapeLeft) => Self::Ccw90,
            (NaturalOrientation::Portrait, PortraitUpsideDown) => Self::Ccw180,
            (NaturalOrientation::Portrait, LandscapeRight) => Self::Ccw270,
        }
    }

    /// Z rotation taking engine image space into host screen space.
    pub fn matrix_engine_to_host(self) -> Mat4 {
        match self {
            Self::Ccw0 => ROTATION_Z0,
            Self::Ccw90 => ROTATION_Z90,
            Self::Ccw180 => ROTATION_Z180,
            Self::Ccw270 => ROTATION_Z270,
        }
    }

    /// Z rotation taking host screen space into engine image space.
    pub fn matrix_host_to_engine(self) -> Mat4 {
        match self {
            Self::Ccw0 => ROTATION_Z0,
            Self::Ccw90 => ROTATION_Z270,
            Self::Ccw180 => ROTATION_Z180,
            Self::Ccw270 => ROTATION_Z90,
        }
    }
}
