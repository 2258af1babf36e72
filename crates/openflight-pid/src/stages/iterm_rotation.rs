//! Iterm Rotation
//!
//! The integral accumulator is a vector expressed in the body frame. As the
//! craft rotates, yesterday's roll error is partly today's yaw error; this
//! stage rotates the accumulated vector by the measured rotation each tick
//! so it stays expressed in a locally consistent frame.

use openflight_profile::XYZ_AXIS_COUNT;

const DEG_TO_RAD: f32 = core::f32::consts::PI / 180.0;

/// Rotate `v` in place by a small rotation vector (radians per axis).
///
/// First-order small-angle rotation applied axis by axis; per-tick angles
/// are well below a milliradian at loop rates, where the magnitude error of
/// the approximation is negligible.
pub fn rotate_vector(v: &mut [f32; XYZ_AXIS_COUNT], rotation: [f32; XYZ_AXIS_COUNT]) {
    for i in 0..XYZ_AXIS_COUNT {
        let i_1 = (i + 1) % 3;
        let i_2 = (i + 2) % 3;
        let new_v = v[i_1] + v[i_2] * rotation[i];
        v[i_2] -= v[i_1] * rotation[i];
        v[i_1] = new_v;
    }
}

/// Rotate the integral vector (and the absolute-control error vector when
/// present) by this tick's measured rotation.
///
/// `gyro` is in deg/s; `dt` the loop period in seconds.
pub fn rotate_iterm_and_axis_error(
    iterm: &mut [f32; XYZ_AXIS_COUNT],
    axis_error: Option<&mut [f32; XYZ_AXIS_COUNT]>,
    gyro: [f32; XYZ_AXIS_COUNT],
    dt: f32,
) {
    let gyro_to_angle = dt * DEG_TO_RAD;
    let rotation = [
        gyro[0] * gyro_to_angle,
        gyro[1] * gyro_to_angle,
        gyro[2] * gyro_to_angle,
    ];
    rotate_vector(iterm, rotation);
    if let Some(axis_error) = axis_error {
        rotate_vector(axis_error, rotation);
    }
}
