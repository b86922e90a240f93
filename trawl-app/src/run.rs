//! Execution of resolved plans: collect, summarise, save, upload.

use crate::plan::{SinkPlan, TikTokPlan, TwitterPlan};
use anyhow::Result;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use trawl_common::{Platform, SearchMode};
use trawl_config::TrawlConfig;
use trawl_sink::s3::S3Sink;
use trawl_sink::{RunMeta, SavedFile, report, write_records};
use trawl_social::tiktok::{TikTokApi, TranscriptClient, VideoQuery, collect_videos};
use trawl_social::twitter::{TweetQuery, TwitterApi, collect_tweets};

/// Conventional exit code for a run cut short by Ctrl-C.
const INTERRUPTED: u8 = 130;

pub async fn run_twitter(
    plan: TwitterPlan,
    cfg: &TrawlConfig,
    cancel: CancellationToken,
) -> Result<ExitCode> {
    let bearer = cfg.require_bearer_token()?;
    let api = TwitterApi::new(bearer.to_string());

    let query = TweetQuery {
        hashtag: plan.hashtag.clone(),
        lang: plan.lang.clone(),
        count: plan.count,
        window: plan.window,
        min_text_length: plan.min_text_length,
        check_content: plan.check_content,
        pause: plan.batch_pause,
        cancel: cancel.clone(),
    };
    let (records, _stats) = collect_tweets(&api, &query).await?;
    report::log_tweet_summary(&records);

    let meta = RunMeta::new(Platform::Twitter, SearchMode::Hashtag, &plan.hashtag);
    let saved = write_records(
        &records,
        &meta,
        plan.sink.format,
        &plan.sink.output_dir,
        plan.sink.output_prefix.as_deref(),
    )?;
    upload(saved.as_ref(), &meta, &plan.sink).await?;

    Ok(finish(&cancel))
}

pub async fn run_tiktok(
    plan: TikTokPlan,
    cfg: &TrawlConfig,
    cancel: CancellationToken,
) -> Result<ExitCode> {
    let api = TikTokApi::new(plan.ms_token.clone(), plan.browser, plan.proxy.as_deref())?;
    let transcripts = transcript_client(&plan, cfg);

    let query = VideoQuery {
        feed: plan.feed.clone(),
        count: plan.count,
        relevance_threshold: plan.relevance_threshold,
        filter: plan.filter.clone(),
        add_comments: plan.add_comments,
        max_comments: plan.max_comments,
        include_replies: plan.include_replies,
        transcript_language: plan.transcript_language.clone(),
        batch_pause: plan.batch_pause,
        cancel: cancel.clone(),
    };
    let records = collect_videos(&api, transcripts.as_ref(), &query).await?;
    report::log_video_summary(&records);

    let meta = RunMeta::new(Platform::TikTok, plan.feed.mode(), plan.feed.term());
    let saved = write_records(
        &records,
        &meta,
        plan.sink.format,
        &plan.sink.output_dir,
        plan.sink.output_prefix.as_deref(),
    )?;
    if let Some(saved) = &saved {
        report::log_video_save_stats(&records, saved);
    }
    upload(saved.as_ref(), &meta, &plan.sink).await?;

    Ok(finish(&cancel))
}

fn transcript_client(plan: &TikTokPlan, cfg: &TrawlConfig) -> Option<TranscriptClient> {
    if !plan.add_transcript {
        return None;
    }
    match cfg
        .tiktok
        .transcript_api_key
        .clone()
        .filter(|k| !k.trim().is_empty())
    {
        Some(key) => Some(TranscriptClient::new(key)),
        None => {
            tracing::warn!(
                "no transcription API key configured (RAPIDAPI_KEY); transcripts disabled"
            );
            None
        }
    }
}

async fn upload(saved: Option<&SavedFile>, meta: &RunMeta, sink: &SinkPlan) -> Result<()> {
    let (Some(saved), Some(s3)) = (saved, &sink.s3) else {
        return Ok(());
    };
    let store = S3Sink::connect(
        s3.bucket.clone(),
        s3.prefix.clone(),
        s3.endpoint.as_deref(),
        s3.region.as_deref(),
    )
    .await;
    store
        .upload_file(saved, meta, sink.format, s3.s3_only)
        .await?;
    Ok(())
}

fn finish(cancel: &CancellationToken) -> ExitCode {
    if cancel.is_cancelled() {
        ExitCode::from(INTERRUPTED)
    } else {
        ExitCode::SUCCESS
    }
}
