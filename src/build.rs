// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Parameter images for every configured population
//!
//! Populations share nothing mutable, so they are built in parallel with
//! rayon. The returned images keep the configuration order.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use neurokin_config::{NeurokinConfig, PopulationConfig};
use neurokin_model::Timestep;
use neurokin_serialization::{serialize_descriptor, ParameterImage};

use crate::assembly::assemble_descriptor;
use crate::error::{NeurokinError, NeurokinResult};

/// File extension of written images
pub const IMAGE_EXTENSION: &str = "bin";

/// One population's image plus the facts a placement step needs
#[derive(Debug, Clone)]
pub struct PopulationImage {
    pub population: String,
    pub n_neurons: usize,
    pub max_atoms_per_core: usize,
    /// CPU cycles per timestep for the whole population
    pub n_cpu_cycles: usize,
    pub image: ParameterImage,
}

/// Build the image of a single population
///
/// The weight-dependence section is appended when the population configures one.
pub fn build_population_image(population: &PopulationConfig, timestep: Timestep) -> NeurokinResult<PopulationImage> {
    let descriptor = assemble_descriptor(population)?;
    let weight_scales = population.resolved_weight_scales();
    let mut image = serialize_descriptor(&descriptor, &weight_scales, timestep)?;

    if let Some(settings) = &population.weight_dependence {
        let dependence = settings.to_dependence();
        dependence.validate()?;
        image.append_weight_dependence(&dependence, &weight_scales, settings.n_weight_terms)?;
    }

    Ok(PopulationImage {
        population: population.name.clone(),
        n_neurons: population.n_neurons,
        max_atoms_per_core: descriptor.max_atoms_per_core(),
        n_cpu_cycles: descriptor.n_cpu_cycles(population.n_neurons),
        image,
    })
}

/// Build every population of a configuration, in parallel
///
/// # Errors
/// The first failing population, wrapped in [`NeurokinError::Population`].
pub fn build_population_images(config: &NeurokinConfig) -> NeurokinResult<Vec<PopulationImage>> {
    let timestep = Timestep::from_micros(config.simulation.timestep_us)?;

    let images = config
        .populations
        .par_iter()
        .map(|population| {
            build_population_image(population, timestep).map_err(|e| e.in_population(population.name.as_str()))
        })
        .collect::<NeurokinResult<Vec<_>>>()?;

    tracing::info!(
        populations = images.len(),
        bytes = images.iter().map(|built| built.image.len()).sum::<usize>(),
        timestep_us = timestep.as_micros(),
        "built population images"
    );
    Ok(images)
}

/// Path an image is written to inside `directory`
pub fn image_path(directory: &Path, population: &str) -> PathBuf {
    directory.join(format!("{}.{}", population, IMAGE_EXTENSION))
}

/// Write each image to `<directory>/<population>.bin`
///
/// Existing files are overwritten; images are regenerated, never patched.
pub fn write_population_images(images: &[PopulationImage], directory: &Path) -> NeurokinResult<Vec<PathBuf>> {
    fs::create_dir_all(directory).map_err(|source| NeurokinError::Io {
        path: directory.display().to_string(),
        source,
    })?;

    let mut written = Vec::with_capacity(images.len());
    for built in images {
        let path = image_path(directory, &built.population);
        fs::write(&path, built.image.bytes()).map_err(|source| NeurokinError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::debug!(population = %built.population, path = %path.display(), bytes = built.image.len(), "wrote image");
        written.push(path);
    }
    Ok(written)
}
