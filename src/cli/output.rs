//! Output formatting module
//!
//! This module renders an opened program in each of the supported output
//! formats.

use crate::config::RenderConfig;
use crate::describe::{AccelDescriber, AccelInfoDescriber, CharClassDescriber, ClassDescriber};
use crate::program::{AuxRecord, Header, Program, ReportId, StateId};
use crate::render::{self, GraphStats};
use crate::Result;
use serde::Serialize;

/// Calculate Blake2b-256 hash of data
fn blake2b_256(data: &[u8]) -> String {
    use blake2::digest::consts::U32;
    use blake2::{Blake2b, Digest};

    let mut hasher = Blake2b::<U32>::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// JSON summary of one blob
#[derive(Debug, Clone, Serialize)]
pub struct ProgramSummary {
    pub name: String,
    pub digest: String,
    pub size: usize,
    pub header: Header,
    pub states: Vec<StateSummary>,
    pub graph: GraphStats,
}

#[derive(Debug, Clone, Serialize)]
pub struct StateSummary {
    pub id: StateId,
    #[serde(flatten)]
    pub aux: AuxRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reports: Option<Vec<ReportId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eod_reports: Option<Vec<ReportId>>,
}

impl ProgramSummary {
    pub fn build(name: &str, program: &Program<'_>, class: &dyn ClassDescriber) -> Result<Self> {
        let mut states = Vec::with_capacity(usize::from(program.state_count()));
        for id in program.states() {
            let aux = program.auxiliary(id)?;
            states.push(StateSummary {
                id,
                aux,
                reports: program.reports(aux.accept)?.map(|list| list.to_vec()),
                eod_reports: program.reports(aux.accept_eod)?.map(|list| list.to_vec()),
            });
        }

        let graph = render::build_graph(program, class)?.stats();

        Ok(Self {
            name: name.to_string(),
            digest: blake2b_256(program.bytes()),
            size: program.len(),
            header: *program.header(),
            states,
            graph,
        })
    }
}

/// Output the text dump
pub fn output_text(
    w: &mut impl std::io::Write,
    program: &Program<'_>,
    accel: &dyn AccelDescriber,
) -> Result<()> {
    render::write_text(w, program, accel)
}

/// Output the DOT graph
pub fn output_dot(
    w: &mut impl std::io::Write,
    program: &Program<'_>,
    class: &dyn ClassDescriber,
    graph_name: &str,
) -> Result<()> {
    let graph = render::build_graph(program, class)?.with_name(graph_name);
    graph.write_dot(w)
}

/// Output the JSON summary
pub fn output_json(
    w: &mut impl std::io::Write,
    name: &str,
    program: &Program<'_>,
    class: &dyn ClassDescriber,
) -> Result<()> {
    let summary = ProgramSummary::build(name, program, class)?;
    serde_json::to_writer_pretty(&mut *w, &summary)?;
    writeln!(w)?; // Add trailing newline
    Ok(())
}

/// Open `blob` and render it in `format`
///
/// Nothing is produced unless the whole rendering succeeds.
pub fn render_blob(
    name: &str,
    blob: &[u8],
    format: super::OutputFormat,
    config: &RenderConfig,
) -> Result<Vec<u8>> {
    use super::OutputFormat;

    let program = Program::open(blob, blob.len())?;
    let class = CharClassDescriber::new(config.class_max_ranges);

    let mut buf = Vec::new();
    match format {
        OutputFormat::Text => output_text(&mut buf, &program, &AccelInfoDescriber::new(class))?,
        OutputFormat::Dot => output_dot(&mut buf, &program, &class, &config.graph_name)?,
        OutputFormat::Json => output_json(&mut buf, name, &program, &class)?,
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use crate::program::{BlobBuilder, Transition};

    fn create_test_blob() -> Vec<u8> {
        let mut builder = BlobBuilder::new(2);
        builder.transitions(1, 0..=u8::MAX, Transition::to(1));
        builder.top(1, Transition::to(1));
        let reports = builder.report_list([7]);
        builder.accept(1, reports);
        builder.build()
    }

    #[test]
    fn test_blake2b_256() {
        let digest = blake2b_256(b"");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8"
        );
    }

    #[test]
    fn test_output_json() {
        let blob = create_test_blob();
        let bytes = render_blob("a.bin", &blob, OutputFormat::Json, &RenderConfig::default())
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["name"], "a.bin");
        assert_eq!(value["size"], blob.len());
        assert_eq!(value["header"]["state_count"], 2);
        assert_eq!(value["states"][1]["reports"], serde_json::json!([7]));
        assert!(value["states"][0].get("reports").is_none());
        assert_eq!(value["graph"]["transition_edges"], 1);
        assert_eq!(value["graph"]["has_cycles"], true);
        assert_eq!(value["digest"], blake2b_256(&blob));
    }

    #[test]
    fn test_output_dot_uses_graph_name() {
        let blob = create_test_blob();
        let config = RenderConfig {
            graph_name: "sheng".to_string(),
            ..RenderConfig::default()
        };
        let bytes = render_blob("a.bin", &blob, OutputFormat::Dot, &config).unwrap();
        let dot = String::from_utf8(bytes).unwrap();
        assert!(dot.starts_with("digraph sheng {"));
        assert!(dot.contains("  1 -> 1 [ label = \"<any>\" ];"));
    }

    #[test]
    fn test_output_text() {
        let blob = create_test_blob();
        let bytes = render_blob("a.bin", &blob, OutputFormat::Text, &RenderConfig::default())
            .unwrap();
        assert!(String::from_utf8(bytes).unwrap().starts_with("sheng DFA\n"));
    }

    #[test]
    fn test_render_blob_rejects_truncated() {
        let blob = create_test_blob();
        let err = render_blob(
            "a.bin",
            &blob[..100],
            OutputFormat::Text,
            &RenderConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err.kind(), "MalformedHeader");
    }

    #[test]
    fn test_aux_overrun_produces_no_output() {
        let mut blob = create_test_blob();
        // aux offset so close to the end that two records cannot fit
        let aux_offset = (blob.len() - 16) as u32;
        blob[20..24].copy_from_slice(&aux_offset.to_le_bytes());

        for format in [OutputFormat::Text, OutputFormat::Dot] {
            let result = render_blob("a.bin", &blob, format, &RenderConfig::default());
            match result {
                Err(err) => assert_eq!(err.kind(), "MalformedHeader", "{format:?}"),
                Ok(bytes) => panic!("{:?} produced {} bytes", format, bytes.len()),
            }
        }
    }
}
