//! EvidencePipeline: resolves experts, retrieves their documents, normalizes
//! them and refines the batch with the configured technique.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info, warn};

use evidex_core::{EvidenceRecord, EvidexConfig, Expert, Locale, Result, SourceInputRef};
use evidex_extract::{BuildTechnique, ExtractionTechnique};
use evidex_ingest::Normalizer;
use evidex_store::{DocumentRetrieval, EntityDirectory};

use crate::types::{CollectStats, EvidenceReport};

/// Top-level pipeline: one directory, one retrieval adapter, one technique.
pub struct EvidencePipeline {
    directory: Arc<dyn EntityDirectory>,
    retrieval: Arc<dyn DocumentRetrieval>,
    normalizer: Normalizer,
    technique: Box<dyn ExtractionTechnique>,
    language: Locale,
}

impl EvidencePipeline {
    pub fn new(
        directory: Arc<dyn EntityDirectory>,
        retrieval: Arc<dyn DocumentRetrieval>,
        normalizer: Normalizer,
        technique: Box<dyn ExtractionTechnique>,
        language: Locale,
    ) -> Self {
        info!(
            "EvidencePipeline initialized: technique={}, language={}",
            technique.name(),
            language
        );
        Self {
            directory,
            retrieval,
            normalizer,
            technique,
            language,
        }
    }

    /// Build the normalizer and technique from `config`.
    pub fn from_config(
        config: &EvidexConfig,
        directory: Arc<dyn EntityDirectory>,
        retrieval: Arc<dyn DocumentRetrieval>,
    ) -> Self {
        Self::new(
            directory,
            retrieval,
            Normalizer::new(config.source_label.clone()),
            config.technique.build(&config.extraction),
            config.language.clone(),
        )
    }

    pub fn technique(&self) -> &dyn ExtractionTechnique {
        self.technique.as_ref()
    }

    pub fn language(&self) -> &Locale {
        &self.language
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Every expert the directory knows.
    pub fn list_experts(&self) -> Result<HashSet<Expert>> {
        let experts = self.directory.list_all()?;
        debug!("Directory returned {} experts", experts.len());
        Ok(experts)
    }

    /// Alias of [`list_experts`](Self::list_experts).
    pub fn get_expert_entities(&self) -> Result<HashSet<Expert>> {
        self.list_experts()
    }

    /// Experts whose display name matches `name` (case-insensitive regex).
    pub fn find_experts(&self, name: &str) -> Result<HashSet<Expert>> {
        let experts = self.directory.find_by_name(name)?;
        debug!("{} experts match {:?}", experts.len(), name);
        Ok(experts)
    }

    /// Alias of [`find_experts`](Self::find_experts).
    pub fn find_expert_by_name(&self, name: &str) -> Result<HashSet<Expert>> {
        self.find_experts(name)
    }

    /// Refined evidence for `expert`, every record stamped with `input`.
    ///
    /// A store outage fails the whole call with `SourceUnavailable`; a
    /// partial set is never returned.
    pub fn collect_evidence(
        &self,
        expert: &Expert,
        input: &SourceInputRef,
    ) -> Result<HashSet<EvidenceRecord>> {
        self.run(expert, input).map(|(evidence, _)| evidence)
    }

    /// Alias of [`collect_evidence`](Self::collect_evidence).
    pub fn get_new_evidences(
        &self,
        expert: &Expert,
        input: &SourceInputRef,
    ) -> Result<HashSet<EvidenceRecord>> {
        self.collect_evidence(expert, input)
    }

    /// Like [`collect_evidence`](Self::collect_evidence), with counters and
    /// the evidence in a stable order.
    pub fn collect_report(&self, expert: &Expert, input: &SourceInputRef) -> Result<EvidenceReport> {
        let (evidence, stats) = self.run(expert, input)?;
        let mut evidence: Vec<EvidenceRecord> = evidence.into_iter().collect();
        evidence.sort_by(|a, b| {
            a.timestamp()
                .cmp(&b.timestamp())
                .then_with(|| a.keywords().cmp(b.keywords()))
        });
        Ok(EvidenceReport {
            expert: expert.clone(),
            technique: self.technique.name().to_string(),
            language: self.language.clone(),
            stats,
            evidence,
        })
    }

    /// Collect evidence for every listed expert.
    ///
    /// Fails as a whole on the first error.
    pub fn collect_all(
        &self,
        input: &SourceInputRef,
    ) -> Result<HashMap<Expert, HashSet<EvidenceRecord>>> {
        let experts = self.list_experts()?;
        let mut all = HashMap::with_capacity(experts.len());
        for expert in experts {
            let evidence = self.collect_evidence(&expert, input)?;
            all.insert(expert, evidence);
        }
        info!("Collected evidence for {} experts", all.len());
        Ok(all)
    }

    fn run(
        &self,
        expert: &Expert,
        input: &SourceInputRef,
    ) -> Result<(HashSet<EvidenceRecord>, CollectStats)> {
        let shared = Arc::new(expert.clone());
        let mut stats = CollectStats::default();

        let mut raw: HashSet<EvidenceRecord> = HashSet::new();
        for record in self.retrieval.fetch_for(expert)? {
            stats.fetched += 1;
            match self.normalizer.normalize(&shared, &record, input) {
                Some(evidence) => {
                    raw.insert(evidence);
                }
                None => stats.skipped += 1,
            }
        }
        stats.raw_evidence = raw.len();

        let refined = self.technique.generate(expert, raw, &self.language);
        stats.refined = refined.len();

        if stats.fetched > 0 && stats.refined == 0 {
            warn!(
                "{} documents for {} produced no evidence with {}",
                stats.fetched,
                expert.id(),
                self.technique.name()
            );
        }

        debug!(
            "Evidence for {} via {}: fetched={}, skipped={}, raw={}, refined={}",
            expert.id(),
            input,
            stats.fetched,
            stats.skipped,
            stats.raw_evidence,
            stats.refined
        );
        Ok((refined, stats))
    }
}
