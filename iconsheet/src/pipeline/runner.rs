//! Fetch, balance, compose and index.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use super::config::PipelineConfig;
use super::error::PipelineError;
use crate::cache::{derive_key, ImageCache};
use crate::entity::{write_index, Entity, IndexRecord};
use crate::fetch::{CacheOrigin, FetchError, HttpClient, ImageFetcher, ReqwestClient};
use crate::group::{balance, Affiliated};
use crate::sprite::{prune_stale_sheets, write_sheet, SpriteComposer};

/// Summary of a pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Entities processed.
    pub entities: usize,
    /// Images already present in the cache.
    pub cache_hits: usize,
    /// Images downloaded during this run.
    pub downloads: usize,
    /// Sprite sheets written.
    pub sheets: usize,
}

/// An entity paired with its cached image.
struct Placed<'a> {
    entity: &'a Entity,
    path: PathBuf,
}

impl Affiliated for Placed<'_> {
    fn affiliation(&self) -> &str {
        &self.entity.affiliation
    }
}

/// Drives a full run for one configuration.
///
/// Entities are processed strictly one at a time; the first error aborts
/// the run.
pub struct SpritePipeline<C> {
    fetcher: ImageFetcher<C>,
    config: PipelineConfig,
}

impl SpritePipeline<ReqwestClient> {
    /// Create a pipeline backed by a real HTTP client.
    pub fn from_config(config: PipelineConfig) -> Result<Self, PipelineError> {
        let client =
            ReqwestClient::with_timeout(config.http_timeout).map_err(PipelineError::Client)?;
        Ok(Self::new(client, config))
    }
}

impl<C: HttpClient> SpritePipeline<C> {
    /// Create a pipeline using `client` for downloads.
    pub fn new(client: C, config: PipelineConfig) -> Self {
        let fetcher = ImageFetcher::new(
            client,
            ImageCache::new(&config.cache_dir),
            config.fetch_policy,
        );
        Self { fetcher, config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &ImageFetcher<C> {
        &self.fetcher
    }

    /// Make sure every entity's image is in the cache.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub async fn fetch_all(
        &self,
        entities: &[Entity],
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        let (_, report) = self.fetch_images(entities, cancel).await?;
        info!(
            cache_hits = report.cache_hits,
            downloads = report.downloads,
            "Fetch complete"
        );
        Ok(report)
    }

    /// Compose sheets and write the index from the cache alone.
    ///
    /// No network access is made. An image missing from the cache fails the
    /// sheet it belongs to.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub async fn pack(
        &self,
        entities: &[Entity],
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        let cache = self.fetcher.cache();
        let mut placed = Vec::with_capacity(entities.len());
        for entity in entities {
            let key = derive_key(&entity.image).map_err(|e| PipelineError::Fetch {
                entity: entity.name.clone(),
                url: entity.image.clone(),
                source: FetchError::from(e),
            })?;
            placed.push(Placed {
                entity,
                path: cache.path_for(&key),
            });
        }

        let sheets = self.pack_placed(&placed, cancel).await?;
        Ok(PipelineReport {
            entities: entities.len(),
            sheets,
            ..Default::default()
        })
    }

    /// Fetch every image, then compose sheets and write the index.
    #[instrument(skip_all, fields(entities = entities.len()))]
    pub async fn run(
        &self,
        entities: &[Entity],
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        let (placed, mut report) = self.fetch_images(entities, cancel).await?;
        report.sheets = self.pack_placed(&placed, cancel).await?;

        info!(
            entities = report.entities,
            cache_hits = report.cache_hits,
            downloads = report.downloads,
            sheets = report.sheets,
            "Run complete"
        );
        Ok(report)
    }

    async fn fetch_images<'a>(
        &self,
        entities: &'a [Entity],
        cancel: &CancellationToken,
    ) -> Result<(Vec<Placed<'a>>, PipelineReport), PipelineError> {
        create_dir(&self.config.cache_dir).await?;

        let mut report = PipelineReport {
            entities: entities.len(),
            ..Default::default()
        };
        let mut placed = Vec::with_capacity(entities.len());

        for entity in entities {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let image = self
                .fetcher
                .fetch_and_cache(&entity.image, cancel)
                .await
                .map_err(|e| match e {
                    FetchError::Cancelled { .. } => PipelineError::Cancelled,
                    e => PipelineError::Fetch {
                        entity: entity.name.clone(),
                        url: entity.image.clone(),
                        source: e,
                    },
                })?;

            match image.origin {
                CacheOrigin::Cached => report.cache_hits += 1,
                CacheOrigin::Downloaded { attempts } => {
                    report.downloads += 1;
                    info!(entity = %entity.name, attempts, "Downloaded image");
                }
            }

            placed.push(Placed {
                entity,
                path: image.path,
            });
        }

        Ok((placed, report))
    }

    /// Returns the number of sheets written.
    async fn pack_placed(
        &self,
        placed: &[Placed<'_>],
        cancel: &CancellationToken,
    ) -> Result<usize, PipelineError> {
        create_dir(&self.config.output_dir).await?;
        if let Some(dir) = self.config.index_dir() {
            create_dir(dir).await?;
        }

        let groups = balance(placed, self.config.group_limits);
        let composer = SpriteComposer::new(self.config.cell_size, self.config.layout);
        let mut records = Vec::with_capacity(placed.len());

        for (sheet, group) in groups.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            let paths: Vec<PathBuf> = group.iter().map(|p| p.path.clone()).collect();
            let out = self.config.sheet_path(sheet);
            let out_for_log = out.clone();

            tokio::task::spawn_blocking(move || {
                let image = composer.compose(&paths)?;
                write_sheet(&image, &out)
            })
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))?
            .map_err(|e| PipelineError::Sprite { sheet, source: e })?;

            debug!(sheet, images = group.len(), path = %out_for_log.display(), "Wrote sheet");

            records.extend(
                group
                    .iter()
                    .enumerate()
                    .map(|(slot, p)| IndexRecord::new(p.entity, sheet, slot)),
            );
        }

        let index_path = self.config.index_path.clone();
        tokio::task::spawn_blocking(move || write_index(&index_path, &records))
            .await
            .map_err(|e| PipelineError::Task(e.to_string()))??;

        // Sheets from an earlier run with more groups are no longer indexed.
        let output_dir = self.config.output_dir.clone();
        let sheet_count = groups.len();
        let pruned = tokio::task::spawn_blocking(move || {
            prune_stale_sheets(&output_dir, sheet_count).map_err(|e| PipelineError::Io {
                path: output_dir.clone(),
                source: e,
            })
        })
        .await
        .map_err(|e| PipelineError::Task(e.to_string()))??;

        info!(
            sheets = groups.len(),
            pruned,
            layout = %self.config.layout,
            cell_size = self.config.cell_size,
            "Packed sprite sheets"
        );
        Ok(groups.len())
    }
}

async fn create_dir(path: &Path) -> Result<(), PipelineError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|e| PipelineError::Io {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{jpeg_bytes, png_bytes, FetchPolicy, MockHttpClient, MockReply};
    use crate::group::GroupLimits;
    use crate::sprite::SpriteError;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn config(root: &Path) -> PipelineConfig {
        PipelineConfig::new(
            root.join("icons"),
            root.join("sprites"),
            root.join("out").join("index.jsonl"),
        )
        .with_cell_size(8)
    }

    fn entities(specs: &[(&str, &str)]) -> Vec<Entity> {
        specs
            .iter()
            .map(|(name, affiliation)| {
                Entity::new(*name, *affiliation, format!("https://cdn.test/{}.jpg", name))
                    .with_field("language", "en")
            })
            .collect()
    }

    fn read_index(path: &Path) -> Vec<Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_run_writes_sheets_and_index() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        let client = MockHttpClient::always(MockReply::ok(jpeg_bytes(16, 16, [200, 0, 0])));
        let pipeline = SpritePipeline::new(client, config.clone());
        let entities = entities(&[("a", "X"), ("b", "Y"), ("c", "Z")]);

        let report = pipeline
            .run(&entities, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            report,
            PipelineReport {
                entities: 3,
                cache_hits: 0,
                downloads: 3,
                sheets: 1
            }
        );
        assert!(config.sheet_path(0).exists());
        let index = read_index(&config.index_path);
        let slots: Vec<&str> = index.iter().map(|r| r["image"].as_str().unwrap()).collect();
        assert_eq!(slots, vec!["0:0", "0:1", "0:2"]);
        assert_eq!(index[0]["language"], "en");
    }

    #[tokio::test]
    async fn test_second_run_hits_cache() {
        let temp = TempDir::new().unwrap();
        let client = MockHttpClient::always(MockReply::ok(jpeg_bytes(4, 4, [0, 0, 200])));
        let pipeline = SpritePipeline::new(client, config(temp.path()));
        let entities = entities(&[("a", "X"), ("b", "X")]);
        let cancel = CancellationToken::new();

        pipeline.run(&entities, &cancel).await.unwrap();
        let report = pipeline.run(&entities, &cancel).await.unwrap();

        assert_eq!(report.cache_hits, 2);
        assert_eq!(report.downloads, 0);
        assert_eq!(pipeline.fetcher().client().calls(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_urls_fetched_once() {
        let temp = TempDir::new().unwrap();
        let client = MockHttpClient::always(MockReply::ok(jpeg_bytes(4, 4, [0, 0, 200])));
        let pipeline = SpritePipeline::new(client, config(temp.path()));
        let mut entities = entities(&[("a", "X")]);
        let url = entities[0].image.clone();
        entities.push(Entity::new("a-alt", "X", url));

        let report = pipeline
            .fetch_all(&entities, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!((report.downloads, report.cache_hits), (1, 1));
        assert_eq!(pipeline.fetcher().client().calls(), 1);
    }

    #[tokio::test]
    async fn test_groups_become_separate_sheets() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path()).with_group_limits(GroupLimits::new(2, 0).unwrap());
        let client = MockHttpClient::always(MockReply::ok(jpeg_bytes(4, 4, [0, 200, 0])));
        let pipeline = SpritePipeline::new(client, config.clone());
        let entities = entities(&[("a", "X"), ("b", "Y"), ("c", "X"), ("d", "X")]);

        let report = pipeline
            .run(&entities, &CancellationToken::new())
            .await
            .unwrap();

        // X: [a, c] [d], Y: [b]
        assert_eq!(report.sheets, 3);
        let index = read_index(&config.index_path);
        let placed: Vec<(&str, &str)> = index
            .iter()
            .map(|r| (r["name"].as_str().unwrap(), r["image"].as_str().unwrap()))
            .collect();
        assert_eq!(
            placed,
            vec![("a", "0:0"), ("c", "0:1"), ("d", "1:0"), ("b", "2:0")]
        );
        for sheet in 0..3 {
            assert!(config.sheet_path(sheet).exists());
        }
    }

    #[tokio::test]
    async fn test_rerun_with_fewer_groups_removes_old_sheets() {
        let temp = TempDir::new().unwrap();
        let client = MockHttpClient::always(MockReply::ok(jpeg_bytes(4, 4, [0, 0, 90])));
        let entities = entities(&[("a", "X"), ("b", "Y"), ("c", "Z")]);
        let cancel = CancellationToken::new();

        let split = config(temp.path()).with_group_limits(GroupLimits::new(1, 1).unwrap());
        let first = SpritePipeline::new(client, split)
            .run(&entities, &cancel)
            .await
            .unwrap();
        assert_eq!(first.sheets, 3);

        let config = config(temp.path());
        let offline = MockHttpClient::always(MockReply::not_found());
        let second = SpritePipeline::new(offline, config.clone())
            .pack(&entities, &cancel)
            .await
            .unwrap();

        assert_eq!(second.sheets, 1);
        assert!(config.sheet_path(0).exists());
        assert!(!config.sheet_path(1).exists());
        assert!(!config.sheet_path(2).exists());
        assert_eq!(read_index(&config.index_path).len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_failure_aborts_before_any_output() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        let client = MockHttpClient::scripted(
            vec![MockReply::ok(jpeg_bytes(4, 4, [1, 2, 3]))],
            MockReply::not_found(),
        );
        let pipeline = SpritePipeline::new(
            client,
            config
                .clone()
                .with_fetch_policy(FetchPolicy::default().with_max_attempts(2)),
        );
        let entities = entities(&[("good", "X"), ("bad", "X"), ("never", "X")]);

        let err = pipeline
            .run(&entities, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            PipelineError::Fetch { entity, source, .. } => {
                assert_eq!(entity, "bad");
                assert!(matches!(
                    source,
                    FetchError::MaxAttemptsExceeded { attempts: 2, .. }
                ));
            }
            other => panic!("Expected Fetch error, got {:?}", other),
        }
        assert_eq!(pipeline.fetcher().client().calls(), 3);
        assert!(!config.index_path.exists());
        assert!(!config.sheet_path(0).exists());
    }

    #[tokio::test]
    async fn test_invalid_content_aborts_run() {
        let temp = TempDir::new().unwrap();
        let client = MockHttpClient::always(MockReply::ok(png_bytes(4, 4)));
        let pipeline = SpritePipeline::new(client, config(temp.path()));

        let err = pipeline
            .run(&entities(&[("a", "X")]), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Fetch {
                source: FetchError::InvalidContentType { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_pack_without_cached_images_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        let client = MockHttpClient::always(MockReply::not_found());
        let pipeline = SpritePipeline::new(client, config.clone());

        let err = pipeline
            .pack(&entities(&[("a", "X")]), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::Sprite {
                sheet: 0,
                source: SpriteError::Decode { .. }
            }
        ));
        assert_eq!(pipeline.fetcher().client().calls(), 0);
        assert!(!config.index_path.exists());
    }

    #[tokio::test]
    async fn test_pack_uses_cache_only() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        let entities = entities(&[("a", "X"), ("b", "Y")]);

        let fetching = SpritePipeline::new(
            MockHttpClient::always(MockReply::ok(jpeg_bytes(4, 4, [9, 9, 9]))),
            config.clone(),
        );
        fetching
            .fetch_all(&entities, &CancellationToken::new())
            .await
            .unwrap();

        let offline = SpritePipeline::new(
            MockHttpClient::always(MockReply::not_found()),
            config.clone(),
        );
        let report = offline
            .pack(&entities, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.sheets, 1);
        assert_eq!(report.downloads + report.cache_hits, 0);
        assert_eq!(offline.fetcher().client().calls(), 0);
        assert_eq!(read_index(&config.index_path).len(), 2);
    }

    #[tokio::test]
    async fn test_cancelled_run_writes_nothing() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        let client = MockHttpClient::always(MockReply::ok(jpeg_bytes(4, 4, [9, 9, 9])));
        let pipeline = SpritePipeline::new(client, config.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pipeline
            .run(&entities(&[("a", "X")]), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_cancelled());
        assert_eq!(pipeline.fetcher().client().calls(), 0);
        assert!(!config.index_path.exists());
    }

    #[tokio::test]
    async fn test_empty_entity_list_writes_empty_index() {
        let temp = TempDir::new().unwrap();
        let config = config(temp.path());
        let pipeline =
            SpritePipeline::new(MockHttpClient::always(MockReply::not_found()), config.clone());

        let report = pipeline.run(&[], &CancellationToken::new()).await.unwrap();

        assert_eq!(report, PipelineReport::default());
        assert_eq!(fs::read_to_string(&config.index_path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_invalid_url_names_entity() {
        let temp = TempDir::new().unwrap();
        let pipeline = SpritePipeline::new(
            MockHttpClient::always(MockReply::not_found()),
            config(temp.path()),
        );
        let entities = vec![Entity::new("broken", "X", "not a url")];

        let err = pipeline
            .pack(&entities, &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            PipelineError::Fetch { entity, url, .. } => {
                assert_eq!(entity, "broken");
                assert_eq!(url, "not a url");
            }
            other => panic!("Expected Fetch error, got {:?}", other),
        }
    }
}
