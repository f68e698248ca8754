// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the long exposure pipeline

use long_exposure::backends::camera::{
    BackendError, BackendResult, CameraFrame, CaptureDevice, ControlQueue, DeviceFormat,
    ExposureDuration, FrameCallback, Framerate,
};
use long_exposure::constants::MAX_FRAME_COUNT;
use long_exposure::backends::virtual_camera::VirtualCamera;
use long_exposure::pipelines::long_exposure::{
    CaptureRequest, CaptureStatus, LongExposurePipeline, PipelineSettings,
};
use long_exposure::{CaptureError, FilmFilter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const WIDTH: u32 = 4;
const HEIGHT: u32 = 3;

#[derive(Default)]
struct MockState {
    calls: Vec<&'static str>,
    callback: Option<FrameCallback>,
    fail_configure: bool,
}

/// Device whose frames are pushed by the test itself
struct MockDevice {
    format: DeviceFormat,
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    fn new(state: Arc<Mutex<MockState>>) -> Self {
        Self {
            format: DeviceFormat {
                width: WIDTH,
                height: HEIGHT,
                framerate: Framerate::from_int(30),
                min_iso: 50.0,
                max_iso: 1600.0,
                min_exposure_duration: ExposureDuration::new(1, 8000),
                max_exposure_duration: ExposureDuration::new(1, 3),
                max_zoom_factor: 1.0,
            },
            state,
        }
    }

    fn record(&self, call: &'static str) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl CaptureDevice for MockDevice {
    fn name(&self) -> &str {
        "Mock"
    }

    fn formats(&self) -> Vec<DeviceFormat> {
        vec![self.format.clone()]
    }

    fn active_format(&self) -> Option<DeviceFormat> {
        Some(self.format.clone())
    }

    fn apply_format(&mut self, _format: &DeviceFormat) -> BackendResult<()> {
        self.record("apply_format");
        Ok(())
    }

    fn lock_and_configure(&mut self, _duration: ExposureDuration, _iso: f32) -> BackendResult<()> {
        self.record("lock_and_configure");
        if self.state.lock().unwrap().fail_configure {
            return Err(BackendError::LockFailed("device busy".into()));
        }
        Ok(())
    }

    fn reset_to_auto(&mut self) -> BackendResult<()> {
        self.record("reset_to_auto");
        Ok(())
    }

    fn set_frame_callback(&mut self, callback: Option<FrameCallback>) -> BackendResult<()> {
        self.record(if callback.is_some() {
            "set_frame_callback"
        } else {
            "clear_frame_callback"
        });
        self.state.lock().unwrap().callback = callback;
        Ok(())
    }

    fn capture_photo(&mut self) -> BackendResult<CameraFrame> {
        self.record("capture_photo");
        Ok(solid_frame([10, 20, 30, 255]))
    }
}

fn solid_frame(rgba: [u8; 4]) -> CameraFrame {
    CameraFrame::from_rgba(WIDTH, HEIGHT, rgba.repeat((WIDTH * HEIGHT) as usize))
}

fn mock_pipeline(filter: FilmFilter) -> (LongExposurePipeline, Arc<Mutex<MockState>>) {
    let state = Arc::new(Mutex::new(MockState::default()));
    let control = ControlQueue::new(Some(Box::new(MockDevice::new(Arc::clone(&state)))));
    let settings = PipelineSettings {
        film_filter: filter,
        ..PipelineSettings::default()
    };
    (LongExposurePipeline::new(control, settings), state)
}

fn count(state: &Arc<Mutex<MockState>>, call: &str) -> usize {
    state.lock().unwrap().calls.iter().filter(|c| **c == call).count()
}

/// Wait until the pipeline installed its frame callback
async fn installed_callback(state: &Arc<Mutex<MockState>>) -> FrameCallback {
    for _ in 0..5000 {
        if let Some(callback) = state.lock().unwrap().callback.clone() {
            return callback;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("frame callback was never installed");
}

#[tokio::test]
async fn test_computational_capture_end_to_end() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);

    let task = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.request_long_exposure(4.0, 100.0).await })
    };

    let callback = installed_callback(&state).await;
    assert_eq!(pipeline.current_status(), CaptureStatus::Collecting);

    let mut progress = Vec::new();
    for i in 0..120u32 {
        let level = if i % 2 == 0 { 100 } else { 200 };
        callback(solid_frame([level, level, level, 255]));
        progress.push(pipeline.current_progress());
    }
    // Late frames are ignored
    callback(solid_frame([0, 0, 0, 255]));

    let image = task.await.unwrap().unwrap();
    assert_eq!(image.dimensions(), (WIDTH, HEIGHT));
    assert!(image.pixels().all(|p| p.0 == [150, 150, 150, 255]));

    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(*progress.last().unwrap(), 1.0);
    assert!(progress[..119].iter().all(|p| *p < 1.0));

    assert_eq!(pipeline.current_status(), CaptureStatus::Done);
    assert_eq!(count(&state, "reset_to_auto"), 1);
    assert_eq!(count(&state, "clear_frame_callback"), 1);
}

#[tokio::test]
async fn test_configuration_error_skips_reset() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);
    state.lock().unwrap().fail_configure = true;

    let result = pipeline.request_long_exposure(4.0, 100.0).await;

    assert!(matches!(result, Err(CaptureError::ConfigurationError(_))));
    assert!(matches!(
        pipeline.current_status(),
        CaptureStatus::Failed(CaptureError::ConfigurationError(_))
    ));
    assert_eq!(count(&state, "lock_and_configure"), 1);
    assert_eq!(count(&state, "reset_to_auto"), 0);
    assert_eq!(count(&state, "set_frame_callback"), 0);
}

#[tokio::test]
async fn test_second_request_while_collecting_is_busy() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);

    let task = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.request_long_exposure(1.0, 100.0).await })
    };
    let callback = installed_callback(&state).await;

    assert_eq!(
        pipeline.request_long_exposure(1.0, 100.0).await,
        Err(CaptureError::Busy)
    );
    assert_eq!(
        pipeline.request_long_exposure(0.1, 100.0).await,
        Err(CaptureError::Busy)
    );

    for _ in 0..30 {
        callback(solid_frame([1, 2, 3, 255]));
    }
    assert!(task.await.unwrap().is_ok());

    // A finished capture leaves the pipeline ready for the next one
    assert!(pipeline.request_long_exposure(0.1, 100.0).await.is_ok());
}

#[tokio::test]
async fn test_cancel_resets_device() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);
    assert!(!pipeline.cancel(), "nothing to cancel while idle");

    let task = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.request_long_exposure(4.0, 100.0).await })
    };
    let callback = installed_callback(&state).await;

    callback(solid_frame([5, 5, 5, 255]));
    callback(solid_frame([5, 5, 5, 255]));
    assert!(pipeline.cancel());
    callback(solid_frame([5, 5, 5, 255]));

    assert_eq!(task.await.unwrap(), Err(CaptureError::Cancelled));
    assert_eq!(
        pipeline.current_status(),
        CaptureStatus::Failed(CaptureError::Cancelled)
    );
    assert_eq!(count(&state, "reset_to_auto"), 1);
}

#[tokio::test]
async fn test_stream_interruption_fails_session() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);

    let task = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.request_long_exposure(4.0, 100.0).await })
    };
    let callback = installed_callback(&state).await;
    callback(solid_frame([5, 5, 5, 255]));
    drop(callback);

    // The device loses its stream
    let lost = state.lock().unwrap().callback.take();
    drop(lost);

    assert_eq!(task.await.unwrap(), Err(CaptureError::StreamInterrupted));
    assert_eq!(count(&state, "reset_to_auto"), 1);
}

#[tokio::test]
async fn test_short_request_uses_hardware_capture() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Negative);

    let image = pipeline.request_long_exposure(0.1, 100.0).await.unwrap();

    assert_eq!(image.get_pixel(0, 0).0, [245, 235, 225, 255]);
    assert_eq!(
        state.lock().unwrap().calls,
        vec!["lock_and_configure", "capture_photo", "reset_to_auto"]
    );
    // The single-shot path does not drive the lifecycle
    assert_eq!(pipeline.current_status(), CaptureStatus::Idle);
}

#[tokio::test]
async fn test_missing_device_is_unavailable() {
    let pipeline = LongExposurePipeline::new(ControlQueue::new(None), PipelineSettings::default());

    assert_eq!(
        pipeline.request_long_exposure(4.0, 100.0).await,
        Err(CaptureError::DeviceUnavailable)
    );
    assert_eq!(pipeline.current_status(), CaptureStatus::Idle);
}

#[tokio::test]
async fn test_invalid_duration_is_rejected() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);
    assert!(matches!(
        pipeline.request_long_exposure(-2.0, 100.0).await,
        Err(CaptureError::InvalidRequest(_))
    ));
    assert!(state.lock().unwrap().calls.is_empty());
}

#[tokio::test]
async fn test_request_beyond_frame_limit_is_rejected() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);

    assert!(matches!(
        pipeline.request_long_exposure(1.0e9, 100.0).await,
        Err(CaptureError::InvalidRequest(_))
    ));
    assert!(state.lock().unwrap().calls.is_empty());
    assert_eq!(pipeline.current_status(), CaptureStatus::Idle);

    // The pipeline stays usable afterwards
    assert!(pipeline.request_long_exposure(0.1, 100.0).await.is_ok());
}

#[tokio::test]
async fn test_largest_allowed_request_collects_every_frame() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);
    let seconds = f64::from(MAX_FRAME_COUNT) / 30.0;

    let task = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.request_long_exposure(seconds, 100.0).await })
    };
    let callback = installed_callback(&state).await;
    for _ in 0..MAX_FRAME_COUNT {
        callback(solid_frame([40, 50, 60, 255]));
    }

    let image = task.await.unwrap().unwrap();
    assert!(image.pixels().all(|p| p.0 == [40, 50, 60, 255]));
}

#[tokio::test]
async fn test_unusable_frames_fail_with_empty_accumulation() {
    let (pipeline, state) = mock_pipeline(FilmFilter::Standard);

    let task = {
        let pipeline = pipeline.clone();
        tokio::spawn(async move { pipeline.request_long_exposure(1.0, 100.0).await })
    };
    let callback = installed_callback(&state).await;
    for _ in 0..30 {
        callback(CameraFrame::from_rgba(WIDTH, HEIGHT, vec![0; 5]));
    }

    assert_eq!(task.await.unwrap(), Err(CaptureError::EmptyAccumulation));
    assert_eq!(
        pipeline.current_status(),
        CaptureStatus::Failed(CaptureError::EmptyAccumulation)
    );
    assert_eq!(count(&state, "reset_to_auto"), 1);
    assert_eq!(count(&state, "clear_frame_callback"), 1);
}

#[tokio::test]
async fn test_device_switch_refreshes_capabilities() {
    let control = ControlQueue::new(Some(Box::new(VirtualCamera::with_default_formats())));
    let pipeline = LongExposurePipeline::new(control.clone(), PipelineSettings::default());

    let before = control.capabilities().await.unwrap();
    assert_eq!(before.max_exposure_duration, ExposureDuration::from_secs(1));
    assert_eq!(before.min_iso, 32.0);

    let state = Arc::new(Mutex::new(MockState::default()));
    control
        .replace_device(Some(Box::new(MockDevice::new(Arc::clone(&state)))))
        .await
        .unwrap();

    let after = control.capabilities().await.unwrap();
    assert_eq!(after.max_exposure_duration, ExposureDuration::new(1, 3));
    assert_eq!((after.min_iso, after.max_iso), (50.0, 1600.0));

    // Requests now go to the new device
    let image = pipeline.request_long_exposure(0.2, 100.0).await.unwrap();
    assert_eq!(image.dimensions(), (WIDTH, HEIGHT));
    assert_eq!(count(&state, "capture_photo"), 1);

    control.replace_device(None).await.unwrap();
    assert_eq!(
        pipeline.request_long_exposure(0.2, 100.0).await,
        Err(CaptureError::DeviceUnavailable)
    );
}

#[tokio::test]
async fn test_completion_callback_receives_none_on_failure() {
    let pipeline = LongExposurePipeline::new(ControlQueue::new(None), PipelineSettings::default());
    let (sender, receiver) = tokio::sync::oneshot::channel();

    let request = CaptureRequest::new(4.0, 100.0).unwrap();
    pipeline
        .request_with_completion(request, move |image| {
            let _ = sender.send(image.is_some());
        })
        .await
        .unwrap();

    assert!(!receiver.await.unwrap());
}

#[tokio::test]
async fn test_virtual_camera_capture() {
    let camera = VirtualCamera::with_default_formats().with_time_scale(0.01);
    let control = ControlQueue::new(Some(Box::new(camera)));
    let pipeline = LongExposurePipeline::new(
        control.clone(),
        PipelineSettings {
            min_format_width: 1280,
            ..PipelineSettings::default()
        },
    );

    assert!(pipeline.prepare_device().await.unwrap());
    let format = control.active_format().await.unwrap().unwrap();
    assert_eq!((format.width, format.height), (1280, 720));

    let mut snapshots = pipeline.subscribe();
    let image = pipeline.request_long_exposure(2.0, 100.0).await.unwrap();

    assert_eq!(image.dimensions(), (1280, 720));
    assert!(image.pixels().all(|p| p[3] == 255));
    let last = snapshots.borrow_and_update().clone();
    assert_eq!(last.status, CaptureStatus::Done);
    assert_eq!(last.progress, 1.0);
}
