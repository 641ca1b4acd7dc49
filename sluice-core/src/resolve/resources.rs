//! Resource list resolution

use tracing::warn;

use crate::domain::pipeline::{PipelineInfo, ResourceSpec};
use crate::resource::{Quantity, QuantityParser, ResourceList, ResourceName};

/// Converts a resource spec into a normalized resource list
///
/// A field that fails to parse is logged and left out of the result; the call
/// itself never fails. Disk is only requested when the spec names one. If
/// `cache_size` is larger than the requested memory, memory is raised to the
/// cache size.
pub fn resolve_resource_list(
    spec: &ResourceSpec,
    cache_size: &str,
    parser: &dyn QuantityParser,
) -> ResourceList {
    let mut result = ResourceList::new();

    let cpu = format!("{:.6}", spec.cpu);
    match parser.parse(&cpu) {
        Ok(quantity) => {
            result.insert(ResourceName::Cpu, quantity);
        }
        Err(e) => warn!("error parsing cpu string {:?}: {}", cpu, e),
    }

    // An unparseable memory request compares as zero against the cache size
    let memory = match parser.parse(&spec.memory) {
        Ok(quantity) => {
            result.insert(ResourceName::Memory, quantity);
            quantity
        }
        Err(e) => {
            warn!("error parsing memory string {:?}: {}", spec.memory, e);
            Quantity::default()
        }
    };

    if !spec.disk.is_empty() {
        match parser.parse(&spec.disk) {
            Ok(quantity) => {
                result.insert(ResourceName::EphemeralStorage, quantity);
            }
            Err(e) => warn!("error parsing disk string {:?}: {}", spec.disk, e),
        }
    }

    if !cache_size.is_empty() {
        match parser.parse(cache_size) {
            Ok(cache) if cache > memory => {
                result.insert(ResourceName::Memory, cache);
            }
            Ok(_) => {}
            Err(e) => warn!("error parsing cache string {:?}: {}", cache_size, e),
        }
    }

    if let Some(gpu) = &spec.gpu {
        let number = gpu.number.to_string();
        if gpu.kind.is_empty() {
            warn!("gpu resource requested without a type, ignoring");
        } else {
            match parser.parse(&number) {
                Ok(quantity) => {
                    result.insert(ResourceName::Extended(gpu.kind.clone()), quantity);
                }
                Err(e) => warn!("error parsing gpu string {:?}: {}", number, e),
            }
        }
    }

    result
}

/// Resources a pipeline's workers minimally require
///
/// Returns `None` if the pipeline declares no resource requests.
pub fn resolve_requests(info: &PipelineInfo, parser: &dyn QuantityParser) -> Option<ResourceList> {
    info.resource_requests
        .as_ref()
        .map(|spec| resolve_resource_list(spec, &info.cache_size, parser))
}

/// Resources a pipeline's workers are limited to
///
/// Returns `None` if the pipeline declares no resource limits.
pub fn resolve_limits(info: &PipelineInfo, parser: &dyn QuantityParser) -> Option<ResourceList> {
    info.resource_limits
        .as_ref()
        .map(|spec| resolve_resource_list(spec, &info.cache_size, parser))
}
