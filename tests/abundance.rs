use assert_matches::assert_matches;

use sourcetune::abundance::{Aggregator, GenomeAbundanceTable, Normalization};
use sourcetune::domain::default_loq;
use sourcetune::error::TuneError;
use sourcetune::sources::SourceMap;

fn source_map(entries: &[(&str, &str)]) -> SourceMap {
    let mut tsv = String::from("genome\tsource\n");
    for (genome, source) in entries {
        tsv.push_str(&format!("{genome}\t{source}\n"));
    }
    SourceMap::from_tsv(&tsv).unwrap()
}

fn abundance_table(entries: &[(&str, f64)]) -> GenomeAbundanceTable {
    let mut tsv = String::from("Genome\tValue\n");
    for (genome, value) in entries {
        tsv.push_str(&format!("{genome}\t{value}\n"));
    }
    GenomeAbundanceTable::from_tsv(&tsv).unwrap()
}

#[test]
fn relative_portions_are_fractions_of_unity() {
    let sources = source_map(&[("g1", "A"), ("g2", "B")]);
    let table = abundance_table(&[("g1", 20.0), ("g2", 5.0)]);
    let portions = Aggregator::new(&sources).summarize(&table, Normalization::Relative);

    assert_eq!(portions.portions[0].source, "A");
    assert_eq!(portions.portions[1].source, "B");
    assert!((portions.portions[0].portion - 0.20).abs() < 1e-12);
    assert!((portions.portions[1].portion - 0.05).abs() < 1e-12);
    assert!(!portions.rescaled);
}

#[test]
fn relative_mode_applies_no_thresholding() {
    let sources = source_map(&[("g1", "A")]);
    let table = abundance_table(&[("g1", 0.03)]);
    let portions = Aggregator::new(&sources).summarize(&table, Normalization::Relative);
    assert!((portions.portions[0].portion - 0.0003).abs() < 1e-15);
}

#[test]
fn relative_sum_matches_table_total() {
    let sources = source_map(&[("g1", "A"), ("g2", "B"), ("g3", "A")]);
    let table = abundance_table(&[("g1", 12.5), ("g2", 7.25), ("g3", 3.5)]);
    let portions = Aggregator::new(&sources).summarize(&table, Normalization::Relative);
    let sum: f64 = portions.portions.iter().map(|p| p.portion).sum();
    assert!((sum * 100.0 - 23.25).abs() < 1e-9);
}

#[test]
fn repeated_genome_rows_sum() {
    let table = GenomeAbundanceTable::from_tsv("Genome\tValue\ng1\t1.5\ng1\t2.5\n").unwrap();
    assert_eq!(table.value("g1"), 4.0);
}

#[test]
fn malformed_metric_is_fatal() {
    let err = GenomeAbundanceTable::from_tsv("Genome\tValue\ng1\tnotanumber\n").unwrap_err();
    assert_matches!(err, TuneError::AbundanceParse(_));
}

#[test]
fn absent_genomes_contribute_zero_and_every_label_appears() {
    let sources = source_map(&[("g1", "A"), ("g2", "B")]);
    let table = abundance_table(&[("g1", 10.0)]);
    let portions = Aggregator::new(&sources).summarize(&table, Normalization::Relative);
    assert_eq!(portions.portions.len(), 2);
    assert_eq!(portions.portions[1].source, "B");
    assert_eq!(portions.portions[1].portion, 0.0);
}

#[test]
fn geq_above_limit_passes_through() {
    let sources = source_map(&[("g1", "A")]);
    let table = abundance_table(&[("g1", 0.5)]);
    let mode = Normalization::GenomeEquivalents {
        geq: 2.0,
        correct_loq: true,
    };
    let portions = Aggregator::new(&sources).summarize(&table, mode);
    assert!((portions.portions[0].portion - 0.5 / 2.0 / 100.0).abs() < 1e-12);
}

#[test]
fn geq_below_limit_clamps_up_when_corrected() {
    let loq = default_loq();
    let sources = source_map(&[("g1", "A")]);
    let table = abundance_table(&[("g1", 0.05)]);
    let mode = Normalization::GenomeEquivalents {
        geq: 2.0,
        correct_loq: true,
    };
    let portions = Aggregator::new(&sources).summarize(&table, mode);
    assert!((portions.portions[0].portion - loq / 2.0 / 100.0).abs() < 1e-12);
}

#[test]
fn geq_below_limit_passes_raw_when_uncorrected() {
    let sources = source_map(&[("g1", "A")]);
    let table = abundance_table(&[("g1", 0.05)]);
    let mode = Normalization::GenomeEquivalents {
        geq: 2.0,
        correct_loq: false,
    };
    let portions = Aggregator::new(&sources).summarize(&table, mode);
    assert!((portions.portions[0].portion - 0.05 / 2.0 / 100.0).abs() < 1e-12);
}

#[test]
fn geq_value_exactly_at_limit_is_not_clamped() {
    let loq = default_loq();
    let sources = source_map(&[("g1", "A")]);
    let table = abundance_table(&[("g1", loq)]);
    for correct_loq in [false, true] {
        let mode = Normalization::GenomeEquivalents {
            geq: 2.0,
            correct_loq,
        };
        let portions = Aggregator::new(&sources).summarize(&table, mode);
        assert!((portions.portions[0].portion - loq / 2.0 / 100.0).abs() < 1e-9);
    }
}

#[test]
fn undetected_genomes_contribute_nothing() {
    let sources = source_map(&[("g1", "A"), ("g2", "A")]);
    let table = abundance_table(&[("g1", 0.0), ("g2", -0.25)]);
    for mode in [
        Normalization::GenomeEquivalents {
            geq: 2.0,
            correct_loq: true,
        },
        Normalization::GenomeEquivalents {
            geq: 2.0,
            correct_loq: false,
        },
    ] {
        let portions = Aggregator::new(&sources).summarize(&table, mode);
        assert_eq!(portions.portions[0].portion, 0.0);
    }
}

#[test]
fn rescale_preserves_ratios_and_sums_to_unity() {
    let sources = source_map(&[("g1", "A"), ("g2", "B")]);
    let table = abundance_table(&[("g1", 1.4), ("g2", 1.0)]);
    let mode = Normalization::GenomeEquivalents {
        geq: 2.0,
        correct_loq: false,
    };
    let portions = Aggregator::new(&sources).summarize(&table, mode);

    assert!(portions.rescaled);
    let sum: f64 = portions.portions.iter().map(|p| p.portion).sum();
    assert!((sum * 100.0 - 1.0).abs() < 1e-9);
    let ratio = portions.portions[0].portion / portions.portions[1].portion;
    assert!((ratio - 0.7 / 0.5).abs() < 1e-9);
    assert!((portions.portions[0].portion * 100.0 - 0.7 / 1.2).abs() < 1e-9);
}

#[test]
fn no_rescale_at_or_below_unity() {
    let sources = source_map(&[("g1", "A"), ("g2", "B")]);
    let table = abundance_table(&[("g1", 1.0), ("g2", 1.0)]);
    let mode = Normalization::GenomeEquivalents {
        geq: 2.0,
        correct_loq: false,
    };
    let portions = Aggregator::new(&sources).summarize(&table, mode);
    assert!(!portions.rescaled);
    assert!((portions.portions[0].portion - 0.005).abs() < 1e-12);
    assert!((portions.portions[1].portion - 0.005).abs() < 1e-12);
}

#[test]
fn quantification_limit_is_injectable() {
    let sources = source_map(&[("g1", "A")]);
    let table = abundance_table(&[("g1", 0.2)]);
    let mode = Normalization::GenomeEquivalents {
        geq: 1.0,
        correct_loq: true,
    };
    let portions = Aggregator::with_loq(&sources, 0.5).summarize(&table, mode);
    assert!((portions.portions[0].portion - 0.5 / 100.0).abs() < 1e-12);
}
