//! # Visual servoing controllers
//!
//! This module provides the visual servoing control law, including its error calculations.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::time::Instant;
use log::{debug, info, trace, warn};

// Internal
use comms_if::eqpt::{
    FrameGeometry, MarkerCorners, MarkerObservation, VelocityCommand, VEL_CMD_LIMIT,
};
use util::{
    maths::{clamp, clamp_abs, lin_map, outside_dead_zone},
    module::Module,
};

use super::{
    ApproachState, ControllerState, InputData, StatusReport, VisServoError, VisServoParams,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The visual servoing controller.
///
/// Holds only the parameters of the control law, all cycle to cycle state lives in the
/// [`ControllerState`] passed to [`Module::proc`].
#[derive(Debug, Clone)]
pub struct VisServo {
    params: VisServoParams,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Module for VisServo {
    type Params = VisServoParams;
    type InitError = VisServoError;

    type State = ControllerState;
    type InputData = InputData;
    type OutputData = Option<VelocityCommand>;
    type StatusReport = StatusReport;
    type ProcError = VisServoError;

    fn from_params(params: Self::Params) -> Result<Self, Self::InitError> {
        params.validate()?;

        Ok(Self { params })
    }

    /// Run the control law for one frame.
    ///
    /// Returns `None` as the output if autonomous approach is disabled, in which case the state
    /// is not modified beyond its label.
    fn proc(&self, state: &mut Self::State, input_data: &Self::InputData)
        -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError>
    {
        let mut report = StatusReport::default();

        if !state.approach_enabled {
            state.label = ApproachState::Off;
            report.label = ApproachState::Off;
            return Ok((None, report));
        }

        let cmd = match input_data.marker {
            Some(ref marker) => self.marker_present(
                state,
                marker,
                input_data.geometry,
                input_data.timestamp,
                &mut report
            )?,
            None => self.marker_absent(state, input_data.timestamp, &mut report)
        };

        state.last_cmd = cmd;
        state.label = report.label;

        trace!("VisServo output: {} ({})", cmd, report.label);

        Ok((Some(cmd), report))
    }
}

impl VisServo {

    pub fn params(&self) -> &VisServoParams {
        &self.params
    }

    /// Handle a frame with no marker in it.
    ///
    /// The previous command is held until the loss timeout expires, after which the vehicle is
    /// stopped and the smoothers zeroed. A state which has never seen a marker since its last
    /// reset is treated as timed out.
    fn marker_absent(
        &self,
        state: &mut ControllerState,
        now: Instant,
        report: &mut StatusReport
    ) -> VelocityCommand {
        report.label = ApproachState::NoMarker;

        let elapsed_s = state.last_marker_time
            .map(|t| now.saturating_duration_since(t).as_secs_f64());

        let timed_out = match elapsed_s {
            Some(e) => e >= self.params.marker_loss_timeout_s,
            None => true
        };

        if timed_out {
            if !state.marker_lost {
                match elapsed_s {
                    Some(e) => warn!("Marker lost for {:.2} s, stopping the vehicle", e),
                    None => debug!("No marker seen since engagement"),
                }
                state.marker_lost = true;
            }

            state.reset_smoothing();
            report.marker_lost = true;

            VelocityCommand::ZERO
        }
        else {
            report.coasting = true;
            state.last_cmd
        }
    }

    /// Run the control law on an observed marker.
    fn marker_present(
        &self,
        state: &mut ControllerState,
        marker: &MarkerObservation,
        geometry: FrameGeometry,
        now: Instant,
        report: &mut StatusReport
    ) -> Result<VelocityCommand, VisServoError> {
        if !geometry.is_valid() {
            return Err(VisServoError::InvalidFrameGeometry(geometry));
        }
        if !marker.size_px.is_finite()
            || !marker.center_px.x.is_finite()
            || !marker.center_px.y.is_finite()
        {
            return Err(VisServoError::InvalidObservation(marker.clone()));
        }

        if state.marker_lost {
            info!("Marker reacquired");
            state.marker_lost = false;
        }
        state.last_marker_time = Some(now);

        let p = &self.params;

        // Lateral error, corrected by moving sideways
        let lat_err_px = calc_lat_error(marker, &geometry);
        let lateral_active = outside_dead_zone(lat_err_px, p.lat_dead_zone_px);
        let raw_lr = if lateral_active {
            clamp_abs(p.lat_k_p * lat_err_px, p.max_lr)
        }
        else {
            0.0
        };

        // Facing error, corrected by turning
        let skew = marker.corners_px.as_ref().and_then(calc_skew);
        let facing_active = skew
            .map(|s| outside_dead_zone(s, p.skew_dead_zone))
            .unwrap_or(false);
        let skew_yaw = match skew {
            Some(s) if facing_active => p.skew_k_p * s,
            _ => 0.0
        };

        // The lateral error also turns the vehicle, but only while the marker is far away.
        // Close in, the lateral error is corrected by the lr axis alone.
        let yaw_suppression = self.yaw_suppression(marker.size_px);
        let lat_yaw = if lateral_active
            && marker.size_px < p.near_size_fraction * p.target_size_px
        {
            p.lat_yaw_k_p * lat_err_px * yaw_suppression
        }
        else {
            0.0
        };
        let raw_yaw = clamp_abs(skew_yaw + lat_yaw, p.max_yaw);

        // Distance error, corrected by moving forwards or backwards
        let size_err_px = p.target_size_px - marker.size_px;
        let raw_fb = self.calc_fb(size_err_px, lateral_active || facing_active);

        // Smooth each axis independently
        let alpha = p.smoothing_alpha;
        let cmd = VelocityCommand {
            lr: state.lr_smoother.update(alpha, raw_lr).round() as i32,
            fb: state.fb_smoother.update(alpha, raw_fb).round() as i32,
            ud: 0,
            yaw: state.yaw_smoother.update(alpha, raw_yaw).round() as i32,
        }.clamped(VEL_CMD_LIMIT);

        report.lat_error_px = Some(lat_err_px);
        report.skew = skew;
        report.size_error_px = Some(size_err_px);
        report.lateral_active = lateral_active;
        report.facing_active = facing_active;
        report.yaw_suppression = yaw_suppression;
        report.raw_lr = raw_lr;
        report.raw_fb = raw_fb;
        report.raw_yaw = raw_yaw;
        report.label = ApproachState::classify(facing_active, lateral_active, cmd.fb);

        Ok(cmd)
    }

    /// Scale on the lateral yaw contribution, 1 for a vanishingly small marker falling to 0 as
    /// the marker reaches the target size.
    fn yaw_suppression(&self, size_px: f64) -> f64 {
        clamp(
            lin_map((0.0, self.params.target_size_px), (1.0, 0.0), size_px),
            0.0,
            1.0
        )
    }

    /// Calculate the raw forward demand from the size error.
    ///
    /// While misaligned the demand is scaled down rather than zeroed. Any positive demand is
    /// floored to the minimum forward demand.
    fn calc_fb(&self, size_err_px: f64, misaligned: bool) -> f64 {
        let p = &self.params;

        if !outside_dead_zone(size_err_px, p.size_dead_zone_px) {
            return 0.0;
        }

        let mut fb = clamp_abs(p.size_k_p * size_err_px, p.max_fb);

        if misaligned {
            fb *= p.misaligned_fb_scale;
        }

        if fb > 0.0 {
            fb = fb.max(p.min_fb);
        }

        fb
    }
}

// -----------------------------------------------------------------------------------------------
// FUNCTIONS
// -----------------------------------------------------------------------------------------------

/// Calculate the lateral error of the marker.
///
/// The lateral error is positive if the marker is right of the frame centre.
pub fn calc_lat_error(marker: &MarkerObservation, geometry: &FrameGeometry) -> f64 {
    marker.center_px.x - geometry.center_x_px()
}

/// Calculate the skew of the marker outline.
///
/// Skew is in `[-1, 1]` and positive when the right edge appears longer than the left edge, i.e.
/// the right side of the marker is closer to the camera. Returns `None` for a degenerate outline.
pub fn calc_skew(corners: &MarkerCorners) -> Option<f64> {
    let left = corners.left_edge_px();
    let right = corners.right_edge_px();
    let total = left + right;

    if total > 0.0 && total.is_finite() {
        Some((right - left) / total)
    }
    else {
        None
    }
}

// -----------------------------------------------------------------------------------------------
// TESTS
// -----------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use nalgebra::Point2;
    use std::time::Duration;

    const GEOM: FrameGeometry = FrameGeometry { width_px: 640, height_px: 480 };

    fn params() -> VisServoParams {
        util::params::from_str(include_str!("../../../params/vis_servo.toml")).unwrap()
    }

    fn servo() -> VisServo {
        VisServo::from_params(params()).unwrap()
    }

    fn enabled() -> ControllerState {
        let mut s = ControllerState::new();
        s.approach_enabled = true;
        s
    }

    /// A face-on square marker at the given horizontal offset from the centre.
    fn square(offset_px: f64, size_px: f64) -> MarkerObservation {
        let c = Point2::new(320.0 + offset_px, 240.0);
        MarkerObservation::new(c, size_px).with_corners(MarkerCorners::square(c, size_px))
    }

    fn input(t: Instant, marker: Option<MarkerObservation>) -> InputData {
        InputData { timestamp: t, geometry: GEOM, marker }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_disabled() {
        let s = servo();
        let mut state = ControllerState::new();
        let t0 = Instant::now();

        let (out, report) = s.proc(&mut state, &input(t0, Some(square(150.0, 40.0)))).unwrap();
        assert_eq!(out, None);
        assert_eq!(report.label, ApproachState::Off);
        assert_eq!(state.label, ApproachState::Off);
        assert_eq!(state.accumulators(), (0.0, 0.0, 0.0));
        assert_eq!(state.last_marker_time(), None);
    }

    #[test]
    fn test_hold_at_target() {
        let s = servo();
        let mut state = enabled();

        let (out, report) = s.proc(
            &mut state, &input(Instant::now(), Some(square(0.0, 150.0)))
        ).unwrap();

        assert_eq!(out, Some(VelocityCommand::ZERO));
        assert_eq!(report.label, ApproachState::Hold);
        assert_eq!(report.skew, Some(0.0));
    }

    #[test]
    fn test_lateral_sign() {
        let s = servo();
        let t0 = Instant::now();

        let mut state = enabled();
        let (out, report) = s.proc(&mut state, &input(t0, Some(square(100.0, 150.0)))).unwrap();
        let cmd = out.unwrap();
        assert!(cmd.lr > 0);
        assert_eq!(cmd.ud, 0);
        assert_eq!(report.label, ApproachState::Centering);

        let mut state = enabled();
        let (out, _) = s.proc(&mut state, &input(t0, Some(square(-100.0, 150.0)))).unwrap();
        assert!(out.unwrap().lr < 0);
    }

    #[test]
    fn test_lateral_dead_zone() {
        let s = servo();
        let mut state = enabled();

        let (out, report) = s.proc(
            &mut state, &input(Instant::now(), Some(square(15.0, 150.0)))
        ).unwrap();
        assert_eq!(out, Some(VelocityCommand::ZERO));
        assert!(!report.lateral_active);
        assert_eq!(report.label, ApproachState::Hold);
    }

    #[test]
    fn test_approach_when_far() {
        let s = servo();
        let mut state = enabled();

        let (out, report) = s.proc(
            &mut state, &input(Instant::now(), Some(square(0.0, 40.0)))
        ).unwrap();
        let cmd = out.unwrap();

        assert!(cmd.fb > 0);
        assert_eq!(cmd.lr, 0);
        assert_eq!(cmd.yaw, 0);
        assert!(close(report.raw_fb, params().max_fb));
        assert_eq!(report.label, ApproachState::Approach);
    }

    #[test]
    fn test_back_off_when_close() {
        let s = servo();
        let mut state = enabled();

        let (out, report) = s.proc(
            &mut state, &input(Instant::now(), Some(square(0.0, 200.0)))
        ).unwrap();

        assert!(out.unwrap().fb < 0);
        assert!(close(report.raw_fb, -20.0));
        assert_eq!(report.label, ApproachState::Hold);
    }

    #[test]
    fn test_misaligned_attenuation_and_floor() {
        let s = servo();
        let t0 = Instant::now();

        // Far and off centre, forward demand is scaled down
        let mut state = enabled();
        let (_, report) = s.proc(&mut state, &input(t0, Some(square(100.0, 40.0)))).unwrap();
        assert!(report.lateral_active);
        assert!(close(report.raw_fb, 30.0 * 0.45));

        // Nearer, the scaled demand would be under the floor
        let mut state = enabled();
        let (_, report) = s.proc(&mut state, &input(t0, Some(square(100.0, 120.0)))).unwrap();
        assert!(close(report.raw_fb, params().min_fb));
    }

    #[test]
    fn test_near_yaw_suppression() {
        let s = servo();
        let t0 = Instant::now();

        // Far away the lateral error turns the vehicle
        let mut state = enabled();
        let (_, report) = s.proc(&mut state, &input(t0, Some(square(100.0, 60.0)))).unwrap();
        assert!(close(report.yaw_suppression, 0.6));
        assert!(close(report.raw_yaw, 0.15 * 100.0 * 0.6));

        // Close in only lr corrects the lateral error
        let mut state = enabled();
        let (_, report) = s.proc(&mut state, &input(t0, Some(square(100.0, 120.0)))).unwrap();
        assert_eq!(report.raw_yaw, 0.0);
        assert!(report.raw_lr > 0.0);
    }

    #[test]
    fn test_facing_does_not_gate_centering() {
        let s = servo();
        let mut state = enabled();

        // Right edge longer than the left edge
        let marker = MarkerObservation::new(Point2::new(420.0, 240.0), 60.0)
            .with_corners(MarkerCorners {
                top_left: Point2::new(370.0, 200.0),
                top_right: Point2::new(470.0, 190.0),
                bottom_right: Point2::new(470.0, 290.0),
                bottom_left: Point2::new(370.0, 280.0),
            });

        let (out, report) = s.proc(&mut state, &input(Instant::now(), Some(marker))).unwrap();
        let cmd = out.unwrap();

        assert!(close(report.skew.unwrap(), 20.0 / 180.0));
        assert!(report.facing_active);
        assert!(report.lateral_active);
        assert_eq!(report.label, ApproachState::Facing);
        assert!(cmd.yaw > 0);
        assert!(cmd.lr > 0);
        assert!(close(report.raw_yaw, 120.0 * 20.0 / 180.0 + 0.15 * 100.0 * 0.6));
    }

    #[test]
    fn test_no_corners() {
        let s = servo();
        let mut state = enabled();
        let marker = MarkerObservation::new(Point2::new(320.0, 240.0), 150.0);

        let (out, report) = s.proc(&mut state, &input(Instant::now(), Some(marker))).unwrap();
        assert_eq!(out, Some(VelocityCommand::ZERO));
        assert_eq!(report.skew, None);
        assert!(!report.facing_active);
        assert_eq!(report.label, ApproachState::Hold);
    }

    #[test]
    fn test_degenerate_corners() {
        let c = Point2::new(10.0, 10.0);
        let corners = MarkerCorners {
            top_left: c,
            top_right: c,
            bottom_right: c,
            bottom_left: c,
        };
        assert_eq!(calc_skew(&corners), None);
    }

    #[test]
    fn test_marker_loss() {
        let s = servo();
        let mut state = enabled();
        let t0 = Instant::now();
        let ms = |m: u64| t0 + Duration::from_millis(m);

        let (first, _) = s.proc(&mut state, &input(t0, Some(square(100.0, 40.0)))).unwrap();
        let first = first.unwrap();
        assert!(!first.is_zero());

        // Short dropout, previous command held
        for m in &[50, 200, 399] {
            let (out, report) = s.proc(&mut state, &input(ms(*m), None)).unwrap();
            assert_eq!(out, Some(first));
            assert!(report.coasting);
            assert_eq!(report.label, ApproachState::NoMarker);
        }

        // Timeout reached, stopped and smoothers zeroed
        let (out, report) = s.proc(&mut state, &input(ms(400), None)).unwrap();
        assert_eq!(out, Some(VelocityCommand::ZERO));
        assert!(report.marker_lost);
        assert_eq!(state.accumulators(), (0.0, 0.0, 0.0));

        // Stays stopped
        let (out, _) = s.proc(&mut state, &input(ms(700), None)).unwrap();
        assert_eq!(out, Some(VelocityCommand::ZERO));

        // Reacquiring starts again from rest
        let (out, _) = s.proc(&mut state, &input(ms(800), Some(square(100.0, 40.0)))).unwrap();
        assert_eq!(out, Some(first));
    }

    #[test]
    fn test_no_marker_since_engagement() {
        let s = servo();
        let mut state = enabled();

        let (out, report) = s.proc(&mut state, &input(Instant::now(), None)).unwrap();
        assert_eq!(out, Some(VelocityCommand::ZERO));
        assert!(report.marker_lost);
        assert_eq!(state.label, ApproachState::NoMarker);
    }

    #[test]
    fn test_converges_to_raw() {
        let s = servo();
        let mut state = enabled();
        let t0 = Instant::now();

        let mut fbs = Vec::new();
        let mut raw_fb = 0.0;
        for i in 0..40 {
            let t = t0 + Duration::from_millis(50 * i);
            let (out, report) = s.proc(&mut state, &input(t, Some(square(0.0, 40.0)))).unwrap();
            fbs.push(out.unwrap().fb);
            raw_fb = report.raw_fb;
        }

        assert!(fbs.windows(2).all(|w| w[0] <= w[1]));
        assert!(fbs[30..].iter().all(|fb| *fb == raw_fb.round() as i32));
    }

    #[test]
    fn test_output_bounded() {
        let mut p = params();
        p.lat_k_p = 10.0;
        p.max_lr = 500.0;
        p.skew_k_p = 1000.0;
        p.lat_yaw_k_p = 10.0;
        p.max_yaw = 500.0;
        p.size_k_p = 10.0;
        p.max_fb = 500.0;
        p.min_fb = 200.0;
        p.smoothing_alpha = 0.0;
        let s = VisServo::from_params(p).unwrap();
        let t0 = Instant::now();

        for offset in &[-5000.0, -320.0, -21.0, 0.0, 21.0, 320.0, 5000.0] {
            for size in &[0.0, 1.0, 40.0, 150.0, 1000.0, 1e9] {
                let mut state = enabled();
                let (out, _) = s.proc(&mut state, &input(t0, Some(square(*offset, *size)))).unwrap();
                let cmd = out.unwrap();
                assert!(cmd.is_legal(), "{} out of range", cmd);
                assert_eq!(cmd.ud, 0);
            }
        }
    }

    #[test]
    fn test_invalid_input() {
        let s = servo();
        let mut state = enabled();
        let t0 = Instant::now();

        let bad_geom = InputData {
            timestamp: t0,
            geometry: FrameGeometry::new(0, 480),
            marker: Some(square(0.0, 150.0)),
        };
        assert!(matches!(
            s.proc(&mut state, &bad_geom),
            Err(VisServoError::InvalidFrameGeometry(_))
        ));

        let nan = MarkerObservation::new(Point2::new(320.0, 240.0), std::f64::NAN);
        assert!(matches!(
            s.proc(&mut state, &input(t0, Some(nan))),
            Err(VisServoError::InvalidObservation(_))
        ));

        // Neither input counts as a sighting
        assert_eq!(state.last_marker_time(), None);
    }
}
