use cgmath::{perspective, Deg, Matrix4};

/// Maps OpenGL clip space (z in -1..1) onto wgpu clip space (z in 0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Right-handed perspective projection for a vertical field of view in
/// degrees, already corrected for wgpu's depth range.
pub fn projection_matrix(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    OPENGL_TO_WGPU_MATRIX * perspective(Deg(fov_y), aspect, near, far)
}

/// Aspect ratio of a surface, guarding against a zero-height (minimised)
/// window.
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

pub fn convert_matrix4_to_array(matrix4: Matrix4<f32>) -> [[f32; 4]; 4] {
    let mut result = [[0.0; 4]; 4];

    for i in 0..4 {
        for j in 0..4 {
            result[i][j] = matrix4[i][j];
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{SquareMatrix, Vector4};

    #[test]
    fn test_depth_is_remapped_to_unit_range() {
        let proj = projection_matrix(45.0, 16.0 / 9.0, 0.1, 100.0);

        let near = proj * Vector4::new(0.0, 0.0, -0.1, 1.0);
        let far = proj * Vector4::new(0.0, 0.0, -100.0, 1.0);
        assert!((near.z / near.w).abs() < 1e-5);
        assert!((far.z / far.w - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_matrix_array_is_column_major() {
        let m = Matrix4::from_translation(cgmath::Vector3::new(1.0, 2.0, 3.0));
        let array = convert_matrix4_to_array(m);
        assert_eq!(array[3], [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(convert_matrix4_to_array(Matrix4::identity())[0], [1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_aspect_ratio_of_minimised_window() {
        assert_eq!(aspect_ratio(960, 0), 960.0);
        assert_eq!(aspect_ratio(960, 540), 960.0 / 540.0);
    }
}
