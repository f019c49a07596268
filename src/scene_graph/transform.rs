use glam::{EulerRot, Mat4, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::IDENTITY
        }
    }

    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn from_matrix(matrix: Mat4) -> Self {
        let (scale, rotation, translation) = matrix.to_scale_rotation_translation();
        Self::new(translation, rotation, scale)
    }

    /// Builds a transform from XYZ euler angles in radians, the host's default rotation mode.
    pub fn from_euler(translation: Vec3, euler: Vec3, scale: Vec3) -> Self {
        Self::new(
            translation,
            Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z),
            scale,
        )
    }

    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    pub fn euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn scale(&self) -> Vec3 {
        self.scale
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_round_trip_keeps_components() {
        let transform = Transform::new(
            Vec3::new(1.0, -2.0, 3.0),
            Quat::from_rotation_z(0.5),
            Vec3::new(2.0, 2.0, 2.0),
        );
        let back = Transform::from_matrix(transform.local_matrix());

        let translation = transform.translation();
        assert!(back.translation().abs_diff_eq(translation, 1e-5));
        assert!(back.rotation().abs_diff_eq(transform.rotation(), 1e-5));
        assert!(back.scale().abs_diff_eq(transform.scale(), 1e-5));
    }
}
