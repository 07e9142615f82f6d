//! Accumulating model transforms.
//!
//! Every mutator right-multiplies a primitive transform onto the current
//! matrix, so calls compose in the order they are made: translating and
//! then rotating spins the object in place at its new position.

use cgmath::{Deg, Matrix4, SquareMatrix, Vector3};

use crate::error::TransformError;

/// A coordinate axis accepted by [`Transform::rotate`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vector3<f32> {
        match self {
            Axis::X => Vector3::unit_x(),
            Axis::Y => Vector3::unit_y(),
            Axis::Z => Vector3::unit_z(),
        }
    }
}

impl TryFrom<char> for Axis {
    type Error = TransformError;

    fn try_from(axis: char) -> Result<Self, Self::Error> {
        match axis {
            'x' => Ok(Axis::X),
            'y' => Ok(Axis::Y),
            'z' => Ok(Axis::Z),
            other => Err(TransformError::InvalidAxis(other)),
        }
    }
}

/// A 4x4 affine model matrix built from translations, rotations and scales.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transform {
    matrix: Matrix4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    pub fn matrix(&self) -> Matrix4<f32> {
        self.matrix
    }

    /// Apply translation (multiplies with existing transform)
    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.matrix = self.matrix * Matrix4::from_translation(Vector3::new(x, y, z));
    }

    /// Apply non-uniform scale (multiplies with existing transform)
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.matrix = self.matrix * Matrix4::from_nonuniform_scale(x, y, z);
    }

    /// Apply a rotation of `degrees` around the axis named by `axis`.
    ///
    /// An axis other than `'x'`, `'y'` or `'z'` is logged and leaves the
    /// matrix untouched.
    pub fn rotate(&mut self, degrees: f32, axis: char) -> Result<(), TransformError> {
        match Axis::try_from(axis) {
            Ok(axis) => {
                self.rotate_about(Deg(degrees), axis);
                Ok(())
            }
            Err(err) => {
                log::error!("{err}");
                Err(err)
            }
        }
    }

    pub fn rotate_about(&mut self, angle: Deg<f32>, axis: Axis) {
        let rotation = match axis {
            Axis::X => Matrix4::from_angle_x(angle),
            Axis::Y => Matrix4::from_angle_y(angle),
            Axis::Z => Matrix4::from_angle_z(angle),
        };
        self.matrix = self.matrix * rotation;
    }

    /// True when the bottom row is `(0, 0, 0, 1)`.
    pub fn is_affine(&self) -> bool {
        let m = &self.matrix;
        m.x.w == 0.0 && m.y.w == 0.0 && m.z.w == 0.0 && m.w.w == 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector4};
    use rand::Rng;

    fn approx_eq(a: &Matrix4<f32>, b: &Matrix4<f32>, eps: f32) -> bool {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() <= eps)
    }

    #[test]
    fn test_translate_round_trip_restores_identity() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let mut transform = Transform::identity();
            transform.rotate_about(Deg(rng.random_range(-180.0..180.0)), Axis::Y);
            transform.scale(2.0, 0.5, 3.0);
            let before = transform.matrix();

            let (x, y, z) = (
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
                rng.random_range(-50.0..50.0),
            );
            transform.translate(x, y, z);
            transform.translate(-x, -y, -z);

            assert!(approx_eq(&before, &transform.matrix(), 1e-3));
        }
    }

    #[test]
    fn test_invalid_axis_is_a_no_op() {
        let mut transform = Transform::identity();
        transform.translate(1.0, 2.0, 3.0);
        let before = transform;

        assert_eq!(
            transform.rotate(45.0, 'w'),
            Err(TransformError::InvalidAxis('w'))
        );
        assert_eq!(
            transform.rotate(45.0, 'w'),
            Err(TransformError::InvalidAxis('w'))
        );
        assert_eq!(transform, before);
    }

    #[test]
    fn test_operations_are_right_multiplied() {
        let mut transform = Transform::identity();
        transform.translate(20.0, 20.0, 20.0);
        transform.scale(5.0, 5.0, 5.0);

        // The local corner (0.25, 0.25, 0.25) is scaled first, then moved
        let corner = transform.matrix() * Vector4::new(0.25, 0.25, 0.25, 1.0);
        assert!((corner.x - 21.25).abs() < 1e-5);
        assert!((corner.y - 21.25).abs() < 1e-5);
        assert!((corner.z - 21.25).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_about_y_turns_x_into_minus_z() {
        let mut transform = Transform::identity();
        transform.rotate(90.0, 'y').unwrap();

        let v = transform.matrix() * Vector4::unit_x();
        assert!((v.truncate() - Vector3::new(0.0, 0.0, -1.0)).magnitude() < 1e-5);
    }

    #[test]
    fn test_transforms_stay_affine() {
        let mut transform = Transform::identity();
        transform.translate(-5.0, 0.1, 5.0);
        transform.rotate(180.0, 'y').unwrap();
        transform.rotate(33.0, 'x').unwrap();
        transform.scale(1.0, 4.0, 0.5);
        assert!(transform.is_affine());
    }
}
