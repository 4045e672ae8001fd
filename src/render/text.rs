//! Line-oriented text dump of a program
//!
//! Output is built in memory and written to the sink only once complete, so a
//! failing describer never leaves a partial dump behind.

use crate::describe::AccelDescriber;
use crate::program::{Program, ReportList};
use crate::Result;
use std::io::Write;

/// Write the text dump of `program` to `w`
pub fn write_text(
    w: &mut impl Write,
    program: &Program<'_>,
    accel: &dyn AccelDescriber,
) -> Result<()> {
    let buf = render_text(program, accel)?;
    w.write_all(&buf)?;
    Ok(())
}

/// Text dump of `program` as bytes
pub fn render_text(program: &Program<'_>, accel: &dyn AccelDescriber) -> Result<Vec<u8>> {
    let mut buf = Vec::new();

    writeln!(buf, "sheng DFA")?;
    dump_header(&mut buf, program)?;

    for state in program.states() {
        let aux = program.auxiliary(state)?;
        writeln!(
            buf,
            "state id: {}, reports offset: {}, EOD reports offset: {}, accel offset: {}, top: {}",
            state, aux.accept, aux.accept_eod, aux.accel, aux.top
        )?;

        if let Some(list) = program.reports(aux.accept)? {
            writeln!(buf, "report list:")?;
            dump_reports(&mut buf, &list)?;
        }
        if let Some(list) = program.reports(aux.accept_eod)? {
            writeln!(buf, "EOD report list:")?;
            dump_reports(&mut buf, &list)?;
        }
        if let Some(view) = program.accel(state)? {
            writeln!(buf, "accel:")?;
            writeln!(buf, "{}", accel.describe(view)?)?;
        }
    }

    writeln!(buf)?;
    dump_table(&mut buf, program)?;
    writeln!(buf)?;

    tracing::debug!("Rendered text dump: {} bytes", buf.len());
    Ok(buf)
}

fn dump_header(buf: &mut Vec<u8>, program: &Program<'_>) -> Result<()> {
    let header = program.header();
    writeln!(
        buf,
        "number of states: {}, DFA engine size: {}",
        header.state_count, header.length
    )?;
    writeln!(
        buf,
        "aux base offset: {}, reports base offset: {}, accel offset: {}",
        header.aux_offset, header.report_offset, header.accel_offset
    )?;
    writeln!(
        buf,
        "anchored start state: {}, floating start state: {}",
        header.anchored, header.floating
    )?;
    writeln!(
        buf,
        "has accel: {} can die: {} single report: {}",
        u8::from(header.flags.has_accel),
        u8::from(header.flags.can_die),
        u8::from(header.flags.single_report)
    )?;
    Ok(())
}

fn dump_reports(buf: &mut Vec<u8>, list: &ReportList<'_>) -> Result<()> {
    writeln!(buf, "reports count: {}", list.len())?;
    for (idx, id) in list.iter().enumerate() {
        writeln!(buf, "  report: {}, report ID: {}", idx, id)?;
    }
    Ok(())
}

/// One row per symbol; accepting lanes carry a `*`
fn dump_table(buf: &mut Vec<u8>, program: &Program<'_>) -> Result<()> {
    for symbol in 0..=u8::MAX {
        let mut row = format!("{:3}: ", symbol);
        for state in program.states() {
            let next = program.decode(state, symbol)?;
            let marker = if next.accepting { '*' } else { ' ' };
            row.push_str(&format!("{:2}{} ", next.state, marker));
        }
        writeln!(buf, "{}", row.trim_end())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::describe::accel::accel_kind;
    use crate::describe::AccelInfoDescriber;
    use crate::program::{AccelView, BlobBuilder, Transition};
    use std::cell::Cell;

    fn text_of(blob: &[u8]) -> String {
        let program = Program::open(blob, blob.len()).unwrap();
        let bytes = render_text(&program, &AccelInfoDescriber::default()).unwrap();
        String::from_utf8(bytes).unwrap()
    }

    fn scenario_a() -> Vec<u8> {
        let mut builder = BlobBuilder::new(2);
        builder.transitions(1, 0..=u8::MAX, Transition::to(1));
        builder.top(1, Transition::to(1));
        let reports = builder.report_list([7]);
        builder.accept(1, reports);
        builder.build()
    }

    #[test]
    fn test_scenario_a_text() {
        let text = text_of(&scenario_a());
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "sheng DFA");
        assert!(lines[1].starts_with("number of states: 2, DFA engine size: "));
        assert_eq!(lines[3], "anchored start state: 1, floating start state: 1");
        assert_eq!(lines[4], "has accel: 0 can die: 0 single report: 0");
        assert!(text.contains("report list:\nreports count: 1\n  report: 0, report ID: 7\n"));

        let rows: Vec<&str> = lines
            .iter()
            .copied()
            .filter(|l| l.len() > 4 && l.as_bytes()[3] == b':')
            .collect();
        assert_eq!(rows.len(), 256);
        assert_eq!(rows[0], "  0:  0   1");
        assert_eq!(rows[255], "255:  0   1");
        assert!(rows.iter().all(|row| row.ends_with("  1")));
    }

    #[test]
    fn test_state_blocks_in_order() {
        let text = text_of(&scenario_a());
        let zero = text.find("state id: 0,").unwrap();
        let one = text.find("state id: 1,").unwrap();
        assert!(zero < one);
        assert!(text.contains("state id: 1, reports offset: "));
        assert!(text.contains(", EOD reports offset: 0, accel offset: 0, top: 1\n"));
    }

    #[test]
    fn test_accepting_lanes_are_marked() {
        let mut builder = BlobBuilder::new(3);
        builder.transition(1, b'a', Transition::new(2, true));
        builder.transition(2, b'a', Transition::to(2));
        let blob = builder.build();
        let text = text_of(&blob);

        let row = text.lines().find(|l| l.starts_with(" 97:")).unwrap();
        assert_eq!(row, " 97:  0   2*  2");
    }

    #[test]
    fn test_eod_reports_and_accel() {
        let mut builder = BlobBuilder::new(2);
        let eod = builder.report_list([3, 3]);
        builder
            .accept_eod(1, eod)
            .accel(1, &[accel_kind::VERMICELLI, 0, b'x']);
        let text = text_of(&builder.build());

        assert!(text.contains(
            "EOD report list:\nreports count: 2\n  report: 0, report ID: 3\n  report: 1, report ID: 3\n"
        ));
        assert!(text.contains("accel:\n  kind: vermicelli, offset: 0, char: x\n"));
        assert!(text.contains("has accel: 1"));
    }

    struct CountingDescriber {
        calls: Cell<usize>,
    }

    impl AccelDescriber for CountingDescriber {
        fn describe(&self, accel: AccelView<'_>) -> Result<String> {
            assert!(!accel.bytes.is_empty());
            self.calls.set(self.calls.get() + 1);
            Ok(format!("  accel for state {}", accel.state))
        }
    }

    #[test]
    fn test_accel_describer_invoked_once_per_descriptor() {
        let mut builder = BlobBuilder::new(3);
        builder.accel(2, &[accel_kind::RED_TAPE, 0]);
        let blob = builder.build();
        let program = Program::open(&blob, blob.len()).unwrap();

        let describer = CountingDescriber {
            calls: Cell::new(0),
        };
        let text = String::from_utf8(render_text(&program, &describer).unwrap()).unwrap();

        assert_eq!(describer.calls.get(), 1);
        assert!(text.contains("accel:\n  accel for state 2\n"));
    }

    #[test]
    fn test_text_is_deterministic() {
        let blob = scenario_a();
        assert_eq!(text_of(&blob), text_of(&blob));
    }

    struct FailingDescriber;

    impl AccelDescriber for FailingDescriber {
        fn describe(&self, accel: AccelView<'_>) -> Result<String> {
            Err(crate::Error::malformed(format!("bad accel at {}", accel.offset)))
        }
    }

    #[test]
    fn test_failed_render_writes_nothing() {
        let mut builder = BlobBuilder::new(2);
        builder.accel(1, &[accel_kind::RED_TAPE, 0]);
        let blob = builder.build();
        let program = Program::open(&blob, blob.len()).unwrap();

        let mut sink = Vec::new();
        assert!(write_text(&mut sink, &program, &FailingDescriber).is_err());
        assert!(sink.is_empty());
    }
}
