//! Startup seeding of the certificate catalog from a TOML file.
//!
//! Catalog content is reference data managed outside the application flow;
//! this loader exists so a deployment can declare its checklist next to
//! `config.toml` instead of hand-editing the database.

use std::path::Path;

use anyhow::Context as _;
use matric_core::{
  catalog::{CertificateType, ProgramCertificateRequirement},
  store::AdmissionStore,
};
use serde::Deserialize;

/// On-disk catalog shape; mirrors the domain types field for field.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
  #[serde(default)]
  pub certificate_types: Vec<CertificateType>,
  #[serde(default)]
  pub requirements:      Vec<ProgramCertificateRequirement>,
}

/// Load `path` and upsert its contents into the store.
pub async fn seed_catalog<S: AdmissionStore>(
  store: &S,
  path: &Path,
) -> anyhow::Result<()> {
  let catalog: CatalogFile = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()))
    .build()
    .with_context(|| format!("failed to read catalog file {path:?}"))?
    .try_deserialize()
    .context("failed to deserialise catalog file")?;

  let types = catalog.certificate_types.len();
  let requirements = catalog.requirements.len();

  for certificate_type in catalog.certificate_types {
    store
      .put_certificate_type(certificate_type)
      .await
      .context("failed to seed certificate type")?;
  }
  for requirement in catalog.requirements {
    store
      .put_requirement(requirement)
      .await
      .context("failed to seed program requirement")?;
  }

  tracing::info!(types, requirements, "seeded certificate catalog");
  Ok(())
}
