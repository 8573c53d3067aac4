use itertools::Itertools;
use proptest::prelude::*;
use split_cluster::matrix::SquareMatrix;
use split_cluster::{ClusterConfig, ClusterError, Clusterer, Split, SupportMethod, TreeLayout};

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("T{i}")).collect()
}

/// Ten taxa T0..T9 with the given 18 branch lengths.
fn ten_taxa_newick(l: &[f64]) -> String {
    format!(
        "(((T0:{},T1:{}):{},(T2:{},(T3:{},T4:{}):{}):{}):{},((T5:{},T6:{}):{},((T7:{},T8:{}):{},T9:{}):{}):{});",
        l[0], l[1], l[2], l[3], l[4], l[5], l[6], l[7], l[8],
        l[9], l[10], l[11], l[12], l[13], l[14], l[15], l[16], l[17]
    )
}

fn ten_taxa(lengths: &[f64], approx_pairs: usize) -> Clusterer {
    let mut run = Clusterer::new(ClusterConfig::default().with_approx_pairs(approx_pairs)).unwrap();
    run.add_names(names(10)).unwrap();
    run.add_newick(&ten_taxa_newick(lengths)).unwrap();
    run
}

/// Eight taxa: two clades of four, every branch of length 1.
const EIGHT: &str = "((((T0:1,T1:1):1,(T2:1,T3:1):1):1,((T4:1,T5:1):1,(T6:1,T7:1):1):1);";

/// PP 0.9 inside each clade of four, 0.1 across.
fn eight_taxa_pp() -> Vec<f64> {
    let mut pp = SquareMatrix::filled(8, 1.0);
    for (i, j) in (0..8).tuple_combinations() {
        pp.set_symmetric(i, j, if i / 4 == j / 4 { 0.9 } else { 0.1 });
    }
    pp.into_vec()
}

#[test]
fn small_example_collapses_or_introduces_single_split() {
    // Left={0,1}, Right={2,3}; closest cross pairs are (0,2) and (1,3)
    let mut d = SquareMatrix::filled(4, 5.0);
    d.set_symmetric(0, 2, 1.0);
    d.set_symmetric(1, 3, 1.0);
    let layout = TreeLayout::new(vec![Split::new(vec![0, 1], vec![2, 3])], d).unwrap();

    let mut run = Clusterer::new(ClusterConfig::default().with_approx_pairs(2)).unwrap();
    run.add_names(names(4)).unwrap();
    run.add_tree(&layout).unwrap();

    let pairs = run.pairs_to_calculate().unwrap();
    assert_eq!(pairs.iter().map(|p| (p.first, p.second)).collect::<Vec<_>>(), vec![(0, 2), (1, 3)]);

    let mut pp = SquareMatrix::filled(4, 0.0);
    for p in &pairs {
        pp.set_symmetric(p.first, p.second, 1.0);
    }
    let clusters = run.produce_clusters(pp.as_slice(), 0.5, SupportMethod::Mean).unwrap();
    assert_eq!(clusters.into_groups(), vec![vec![0, 1, 2, 3]]);

    for p in &pairs {
        pp.set_symmetric(p.first, p.second, 0.1);
    }
    let clusters = run.produce_clusters(pp.as_slice(), 0.5, SupportMethod::Mean).unwrap();
    assert_eq!(clusters.into_groups(), vec![vec![0, 1], vec![2, 3]]);
}

#[test]
fn newick_tree_end_to_end() {
    let mut run = Clusterer::with_defaults();
    run.add_names(names(8)).unwrap();
    run.add_newick(EIGHT).unwrap();

    // the root split is seen from both root children but kept once
    assert_eq!(run.splits().len(), 5);

    let pp = eight_taxa_pp();
    let groups = |threshold| {
        run.produce_clusters(&pp, threshold, SupportMethod::Mean).unwrap().into_groups()
    };

    // cherry splits average (4 x 0.9 + 6 x 0.1) / 10 = 0.42; the root split 0.1
    assert_eq!(groups(0.05), vec![(0..8).collect::<Vec<_>>()]);
    assert_eq!(groups(0.4), vec![vec![0, 1, 2, 3], vec![4, 5, 6, 7]]);
    assert_eq!(groups(0.5), vec![vec![0, 1], vec![2, 3], vec![4, 5], vec![6, 7]]);
}

#[test]
fn names_reorder_taxon_indices() {
    let mut run = Clusterer::with_defaults();
    let shuffled: Vec<String> = [4, 0, 5, 1, 6, 2, 7, 3].iter().map(|i| format!("T{i}")).collect();
    run.add_names(shuffled.clone()).unwrap();
    run.add_newick(EIGHT).unwrap();

    let pp = vec![0.0; 64];
    let clusters = run.produce_clusters(&pp, 0.5, SupportMethod::Mean).unwrap();
    let named: Vec<Vec<&str>> = clusters.named(&shuffled);
    assert_eq!(
        named,
        vec![vec!["T4", "T5"], vec!["T0", "T1"], vec!["T6", "T7"], vec!["T2", "T3"]]
    );
}

#[test]
fn unknown_method_is_rejected() {
    let err = "median".parse::<SupportMethod>().unwrap_err();
    assert!(matches!(err, ClusterError::UnknownMethod(_)));
    assert!(matches!(SupportMethod::from_code(7), Err(ClusterError::UnknownMethod(_))));
}

#[test]
fn failed_tree_attach_leaves_run_reusable() {
    let mut run = Clusterer::with_defaults();
    run.add_names(names(8)).unwrap();

    assert!(matches!(
        run.add_newick("((X:1,T1:1):1,(T2:1,T3:1):1,(T4:1,T5:1):1,(T6:1,T7:1):1);"),
        Err(ClusterError::UnknownLeaf { .. })
    ));
    assert!(!run.is_ready());

    run.add_newick(EIGHT).unwrap();
    assert!(run.is_ready());
}

proptest! {
    #[test]
    fn partition_is_exact_cover_and_deterministic(
        lengths in prop::collection::vec(0.01f64..5.0, 18),
        pp in prop::collection::vec(0.0f64..1.0, 100),
        threshold in 0.0f64..1.0,
    ) {
        let run = ten_taxa(&lengths, 10);
        let first = run.produce_clusters(&pp, threshold, SupportMethod::Mean).unwrap();
        prop_assert!(first.is_exact_cover(10));
        prop_assert!(first.groups().iter().all(|g| !g.is_empty() && g.windows(2).all(|w| w[0] < w[1])));
        prop_assert!(first.groups().windows(2).all(|w| w[0][0] < w[1][0]));

        let again = ten_taxa(&lengths, 10).produce_clusters(&pp, threshold, SupportMethod::Mean).unwrap();
        prop_assert_eq!(first, again);
    }

    #[test]
    fn raising_threshold_never_merges_groups(
        lengths in prop::collection::vec(0.01f64..5.0, 18),
        pp in prop::collection::vec(0.0f64..1.0, 100),
        low in 0.0f64..1.0,
        step in 0.0f64..0.5,
    ) {
        let run = ten_taxa(&lengths, 10);
        let coarse = run.produce_clusters(&pp, low, SupportMethod::Mean).unwrap();
        let fine = run.produce_clusters(&pp, low + step, SupportMethod::Mean).unwrap();
        prop_assert!(coarse.len() <= fine.len());

        // every fine group sits inside one coarse group
        for group in fine.groups() {
            prop_assert!(coarse.groups().iter().any(|c| group.iter().all(|t| c.contains(t))));
        }
    }

    #[test]
    fn sampling_respects_bound_and_caps(
        lengths in prop::collection::vec(0.01f64..5.0, 18),
        approx_pairs in 1usize..25,
    ) {
        let run = ten_taxa(&lengths, approx_pairs);

        for (idx, split) in run.splits().iter().enumerate() {
            let pairs = run.pairs_for_split(idx).unwrap();
            let (small, big) = split.small_big();
            prop_assert!(!pairs.is_empty());
            prop_assert!(pairs.len() <= approx_pairs);

            let small_cap = approx_pairs.div_ceil(small.len()) + 1;
            let big_cap = approx_pairs.div_ceil(big.len()) + 1;
            for (taxon, count) in pairs.iter().counts_by(|p| p.first) {
                prop_assert!(small.contains(&taxon));
                prop_assert!(count <= small_cap);
            }
            for (taxon, count) in pairs.iter().counts_by(|p| p.second) {
                prop_assert!(big.contains(&taxon));
                prop_assert!(count <= big_cap);
            }
        }

        let all = run.pairs_to_calculate().unwrap();
        prop_assert!(all.iter().all(|p| p.first < p.second));
        prop_assert!(all.windows(2).all(|w| w[0] < w[1]));
    }
}
