//! End-to-end worker and dispatcher behavior against in-memory fakes.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::{ImageFormat, Rgb, RgbImage};
use weddia_core::models::{JobDescriptor, JobStatus, MediaType, UploadJob};
use weddia_worker::test_helpers::{
    stage_job, MockJobStore, MockMediaStore, MockQueue, MockStorage,
};
use weddia_worker::{JobDispatcher, JobProcessor, NoopGalleryRefresh};

// JPEG has no alpha channel, so the fixture must be RGB.
fn jpeg_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(32, 24, Rgb([180, 90, 40]));
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .unwrap();
    buffer
}

struct Harness {
    storage: Arc<MockStorage>,
    jobs: Arc<MockJobStore>,
    media: Arc<MockMediaStore>,
    processor: Arc<JobProcessor>,
}

fn harness() -> Harness {
    let storage = Arc::new(MockStorage::new());
    let jobs = Arc::new(MockJobStore::new());
    let media = Arc::new(MockMediaStore::new());
    let processor = Arc::new(JobProcessor::new(
        jobs.clone(),
        media.clone(),
        storage.clone(),
        Arc::new(NoopGalleryRefresh),
    ));
    Harness {
        storage,
        jobs,
        media,
        processor,
    }
}

fn descriptor(job: &UploadJob) -> JobDescriptor {
    JobDescriptor {
        job_id: job.id,
        wedding_id: job.wedding_id,
        user_id: job.user_id,
        posted_user_name: job.posted_user_name.clone(),
        file_metadata: job.file_metadata.clone(),
    }
}

#[tokio::test]
async fn six_valid_jpegs_complete_with_six_image_rows() {
    let h = harness();
    let files: Vec<(&str, &str, Vec<u8>)> = (0..6)
        .map(|_| ("wedding.jpg", "image/jpeg", jpeg_bytes()))
        .collect();
    let (job, _) = stage_job(&h.storage, files);
    let job_id = job.id;
    h.jobs.put_job(job);

    let outcome = h.processor.process_job(job_id).await.unwrap();

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.processed_files, 6);
    assert_eq!(outcome.failed_files, 0);

    let rows = h.media.rows();
    assert_eq!(rows.len(), 6);
    assert!(rows.iter().all(|m| m.media_type == MediaType::Image));
    assert!(rows.iter().all(|m| m.posted_user_name == "Alice"));

    let stored = h.jobs.job(job_id).unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert!(stored.error_message.is_none());
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn one_corrupt_file_of_five_still_completes() {
    let h = harness();
    let (job, _) = stage_job(
        &h.storage,
        vec![
            ("a.jpg", "image/jpeg", jpeg_bytes()),
            ("b.jpg", "image/jpeg", jpeg_bytes()),
            ("broken.jpg", "image/jpeg", b"garbage".to_vec()),
            ("d.jpg", "image/jpeg", jpeg_bytes()),
            ("e.jpg", "image/jpeg", jpeg_bytes()),
        ],
    );
    let job_id = job.id;
    h.jobs.put_job(job);

    let outcome = h.processor.process_job(job_id).await.unwrap();

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.processed_files, 4);
    assert_eq!(outcome.failed_files, 1);
    assert_eq!(h.media.rows().len(), 4);

    let stored = h.jobs.job(job_id).unwrap();
    let message = stored.error_message.unwrap();
    assert!(message.contains("broken.jpg"));
}

#[tokio::test]
async fn all_corrupt_files_fail_the_job() {
    let h = harness();
    let files: Vec<(&str, &str, Vec<u8>)> = (0..5)
        .map(|_| ("bad.jpg", "image/jpeg", b"not an image".to_vec()))
        .collect();
    let (job, _) = stage_job(&h.storage, files);
    let job_id = job.id;
    h.jobs.put_job(job);

    let outcome = h.processor.process_job(job_id).await.unwrap();

    assert_eq!(outcome.status, JobStatus::Failed);
    assert_eq!(outcome.processed_files, 0);
    assert_eq!(outcome.failed_files, 5);
    assert!(h.media.rows().is_empty());

    let stored = h.jobs.job(job_id).unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.completed_at.is_some());
}

#[tokio::test]
async fn counters_are_persisted_after_every_file() {
    let h = harness();
    let (job, _) = stage_job(
        &h.storage,
        vec![
            ("a.jpg", "image/jpeg", jpeg_bytes()),
            ("broken.jpg", "image/jpeg", b"x".to_vec()),
            ("c.jpg", "image/jpeg", jpeg_bytes()),
        ],
    );
    let job_id = job.id;
    h.jobs.put_job(job);

    h.processor.process_job(job_id).await.unwrap();

    let writes = h.jobs.counter_writes.lock().unwrap().clone();
    assert_eq!(writes, vec![(1, 0), (1, 1), (2, 1)]);

    let stored = h.jobs.job(job_id).unwrap();
    assert_eq!(
        stored.processed_files + stored.failed_files,
        stored.total_files
    );
}

#[tokio::test]
async fn staged_copies_are_deleted_and_final_keys_get_webp_extension() {
    let h = harness();
    let (job, metadata) = stage_job(
        &h.storage,
        vec![
            ("photo.jpg", "image/jpeg", jpeg_bytes()),
            ("clip.mp4", "video/mp4", vec![0u8; 64]),
        ],
    );
    let job_id = job.id;
    h.jobs.put_job(job);

    h.processor.process_job(job_id).await.unwrap();

    for file in &metadata {
        assert!(!h.storage.has_file(&file.temp_key));
    }

    // Re-encoded image is promoted under .webp, the video keeps its key.
    let image_key = metadata[0].storage_key.replace(".jpg", ".webp");
    assert!(h.storage.has_file(&image_key));
    assert!(h.storage.has_file(&metadata[1].storage_key));

    let rows = h.media.rows();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().any(|m| m.media_type == MediaType::Video));
    assert!(rows.iter().any(|m| m.url.ends_with(".webp")));
}

#[tokio::test]
async fn fetch_failures_count_as_file_failures() {
    let h = harness();
    let (mut job, _) = stage_job(&h.storage, vec![("a.jpg", "image/jpeg", jpeg_bytes())]);
    // Second file was never staged, so its fetch fails.
    let mut missing = job.file_metadata[0].clone();
    missing.file_name = "missing.jpg".to_string();
    missing.temp_key = "temp/weddings/none/0_none.jpg".to_string();
    missing.storage_key = "weddings/none/0_none.jpg".to_string();
    job.file_metadata.push(missing);
    job.total_files = 2;
    let job_id = job.id;
    h.jobs.put_job(job);

    let outcome = h.processor.process_job(job_id).await.unwrap();

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(outcome.processed_files, 1);
    assert_eq!(outcome.failed_files, 1);
    let stored = h.jobs.job(job_id).unwrap();
    assert!(stored.error_message.unwrap().contains("missing.jpg"));
}

#[tokio::test]
async fn reprocessing_does_not_duplicate_media_rows() {
    let h = harness();
    let (job, metadata) = stage_job(&h.storage, vec![("clip.mp4", "video/mp4", vec![1u8; 32])]);
    let job_id = job.id;
    h.jobs.put_job(job);

    h.processor.process_job(job_id).await.unwrap();
    assert_eq!(h.media.rows().len(), 1);

    // Redelivery of a run that died between insert and finalize: the job is
    // still marked processing, so the loop runs again over the same file.
    let mut stored = h.jobs.job(job_id).unwrap();
    stored.status = JobStatus::Processing;
    stored.completed_at = None;
    h.jobs.put_job(stored);
    h.storage.set_file(&metadata[0].temp_key, vec![1u8; 32]);
    let outcome = h.processor.process_job(job_id).await.unwrap();

    assert_eq!(outcome.status, JobStatus::Completed);
    assert_eq!(h.media.rows().len(), 1);
}

#[tokio::test]
async fn redelivered_finished_jobs_keep_their_terminal_record() {
    let h = harness();
    let (job, _) = stage_job(&h.storage, vec![("photo.jpg", "image/jpeg", jpeg_bytes())]);
    let job_id = job.id;
    h.jobs.put_job(job);

    let first = h.processor.process_job(job_id).await.unwrap();
    assert_eq!(first.status, JobStatus::Completed);
    let writes_after_first = h.jobs.counter_writes.lock().unwrap().len();

    // Redelivery after the staged copy is gone: the terminal record must
    // stand, with no counter regress and no second per-file loop.
    let second = h.processor.process_job(job_id).await.unwrap();

    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(second.processed_files, 1);
    assert_eq!(second.failed_files, 0);

    let stored = h.jobs.job(job_id).unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.processed_files, 1);
    assert_eq!(stored.failed_files, 0);
    assert_eq!(h.media.rows().len(), 1);
    assert_eq!(
        h.jobs.counter_writes.lock().unwrap().len(),
        writes_after_first
    );
}

#[tokio::test]
async fn direct_dispatch_runs_the_job_to_completion() {
    let h = harness();
    let (job, _) = stage_job(&h.storage, vec![("a.jpg", "image/jpeg", jpeg_bytes())]);
    let desc = descriptor(&job);
    let job_id = job.id;
    h.jobs.put_job(job);

    let dispatcher = JobDispatcher::direct(h.processor.clone(), h.jobs.clone());
    dispatcher.dispatch(&desc).await.unwrap();

    // Fire-and-forget: wait for the spawned worker to finish.
    for _ in 0..50 {
        if let Some(job) = h.jobs.job(job_id) {
            if job.status.is_terminal() {
                break;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let stored = h.jobs.job(job_id).unwrap();
    assert_eq!(stored.status, JobStatus::Completed);
    assert_eq!(stored.processed_files, 1);
}

#[tokio::test]
async fn queued_dispatch_publishes_the_descriptor() {
    let h = harness();
    let (job, _) = stage_job(&h.storage, vec![("a.jpg", "image/jpeg", jpeg_bytes())]);
    let desc = descriptor(&job);
    h.jobs.put_job(job);

    let queue = Arc::new(MockQueue::new());
    let dispatcher = JobDispatcher::queued(
        h.processor.clone(),
        h.jobs.clone(),
        queue.clone(),
        "https://api.example.com/api/jobs/process".to_string(),
        2,
    );

    dispatcher.dispatch(&desc).await.unwrap();

    let published = queue.published.lock().unwrap();
    assert_eq!(published.len(), 1);
    let (target, body, retries) = &published[0];
    assert_eq!(target, "https://api.example.com/api/jobs/process");
    assert_eq!(*retries, 2);
    assert_eq!(body["job_id"], desc.job_id.to_string());
}

#[tokio::test]
async fn publish_failure_marks_the_job_failed() {
    let h = harness();
    let (job, _) = stage_job(&h.storage, vec![("a.jpg", "image/jpeg", jpeg_bytes())]);
    let desc = descriptor(&job);
    let job_id = job.id;
    h.jobs.put_job(job);

    let queue = Arc::new(MockQueue::new());
    queue.fail_next_publish();
    let dispatcher = JobDispatcher::queued(
        h.processor.clone(),
        h.jobs.clone(),
        queue,
        "https://api.example.com/api/jobs/process".to_string(),
        2,
    );

    let result = dispatcher.dispatch(&desc).await;
    assert!(result.is_err());

    let stored = h.jobs.job(job_id).unwrap();
    assert_eq!(stored.status, JobStatus::Failed);
    assert!(stored.error_message.is_some());
    assert!(stored.completed_at.is_some());
    assert!(h.media.rows().is_empty());
}
