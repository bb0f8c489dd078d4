use glam::DQuat;

/// Something that accepts an orientation quaternion in (x, y, z, w) order.
pub trait OrientationTarget {
    fn set_orientation(&self, quat: [f64; 4]);
}

/// Euler angles driving the compositor view. Radians, left unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationState {
    /// Rotation around the x axis.
    pub roll: f64,
    /// Rotation around the y axis.
    pub pitch: f64,
    /// Rotation around the z axis.
    pub yaw: f64,
}

impl OrientationState {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    pub fn quaternion(&self) -> DQuat {
        euler_to_quat(self.roll, self.pitch, self.yaw)
    }
}

/// Extrinsic x-y-z rotation: roll about fixed X, then pitch about fixed Y,
/// then yaw about fixed Z.
pub fn euler_to_quat(roll: f64, pitch: f64, yaw: f64) -> DQuat {
    DQuat::from_rotation_z(yaw) * DQuat::from_rotation_y(pitch) * DQuat::from_rotation_x(roll)
}

/// Owns the orientation state and the compositor it feeds.
/// One `tick` per timer period.
pub struct OrientationAnimator<T: OrientationTarget> {
    state: OrientationState,
    pitch_step: f64,
    target: T,
    ticks: u64,
}

impl<T: OrientationTarget> OrientationAnimator<T> {
    pub fn new(state: OrientationState, pitch_step: f64, target: T) -> Self {
        Self {
            state,
            pitch_step,
            target,
            ticks: 0,
        }
    }

    /// Advance pitch by one step and push the new orientation.
    /// Always returns true; the animation has no natural end.
    pub fn tick(&mut self) -> bool {
        self.state.pitch += self.pitch_step;
        self.ticks += 1;

        let quat = self.state.quaternion().to_array();
        log::trace!(
            "tick {}: pitch={:.3} quat=[{:.4}, {:.4}, {:.4}, {:.4}]",
            self.ticks,
            self.state.pitch,
            quat[0],
            quat[1],
            quat[2],
            quat[3]
        );
        self.target.set_orientation(quat);
        true
    }

    pub fn state(&self) -> OrientationState {
        self.state
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        writes: RefCell<Vec<[f64; 4]>>,
    }

    impl OrientationTarget for Recorder {
        fn set_orientation(&self, quat: [f64; 4]) {
            self.writes.borrow_mut().push(quat);
        }
    }

    fn norm(q: [f64; 4]) -> f64 {
        q.iter().map(|c| c * c).sum::<f64>().sqrt()
    }

    #[test]
    fn zero_angles_give_identity() {
        assert_eq!(euler_to_quat(0.0, 0.0, 0.0).to_array(), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn conversion_is_unit_norm() {
        let samples = [-100.0, -3.5, -1.0, -0.01, 0.0, 0.3, 1.57, 2.0, 6.3, 42.0, 1e4];
        for &r in &samples {
            for &p in &samples {
                for &y in &samples {
                    let q = euler_to_quat(r, p, y).to_array();
                    assert!(
                        (norm(q) - 1.0).abs() < 1e-9,
                        "non-unit quaternion for ({r}, {p}, {y}): {q:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn single_axis_rotations() {
        let half = std::f64::consts::FRAC_PI_4;
        let q = euler_to_quat(std::f64::consts::FRAC_PI_2, 0.0, 0.0).to_array();
        assert!((q[0] - half.sin()).abs() < 1e-12);
        assert!((q[3] - half.cos()).abs() < 1e-12);

        let q = euler_to_quat(0.0, std::f64::consts::FRAC_PI_2, 0.0).to_array();
        assert!((q[1] - half.sin()).abs() < 1e-12);

        let q = euler_to_quat(0.0, 0.0, std::f64::consts::FRAC_PI_2).to_array();
        assert!((q[2] - half.sin()).abs() < 1e-12);
    }

    #[test]
    fn axes_are_applied_extrinsically() {
        // Roll first about fixed X, then yaw about fixed Z.
        let q = euler_to_quat(0.3, 0.0, 0.7);
        let expected = DQuat::from_rotation_z(0.7) * DQuat::from_rotation_x(0.3);
        assert!(q.abs_diff_eq(expected, 1e-12));
        let wrong_order = DQuat::from_rotation_x(0.3) * DQuat::from_rotation_z(0.7);
        assert!(!q.abs_diff_eq(wrong_order, 1e-6));
    }

    #[test]
    fn tick_steps_pitch_only() {
        let start = OrientationState::new(0.2, 0.0, -0.4);
        let mut anim = OrientationAnimator::new(start, 0.01, Recorder::default());

        let mut prev = anim.state();
        for _ in 0..50 {
            assert!(anim.tick());
            let cur = anim.state();
            assert!((cur.pitch - prev.pitch - 0.01).abs() < 1e-12);
            assert_eq!(cur.roll, prev.roll);
            assert_eq!(cur.yaw, prev.yaw);
            prev = cur;
        }
        assert_eq!(anim.ticks(), 50);
    }

    #[test]
    fn tick_writes_current_quaternion() {
        let mut anim = OrientationAnimator::new(OrientationState::default(), 0.01, Recorder::default());
        anim.tick();
        anim.tick();

        let writes = anim.target().writes.borrow();
        assert_eq!(writes.len(), 2);
        let expected = euler_to_quat(0.0, 0.02, 0.0).to_array();
        for (a, b) in writes[1].iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert!((norm(writes[0]) - 1.0).abs() < 1e-12);
    }
}
