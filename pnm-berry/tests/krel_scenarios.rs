//! Krel 分析与聚合的场景测试.

use pnm_berry::network::throat_shape_factor;
use pnm_berry::prelude::*;

fn f64_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// `(cycle, Sw, Pc, Krw, Kro)` 行.
fn table(rows: &[(u8, f64, f64, f64, f64)]) -> KrelCycleTable {
    let columns = vec![
        ("cycle", rows.iter().map(|r| r.0 as f64).collect::<Vec<_>>()),
        ("Sw", rows.iter().map(|r| r.1).collect()),
        ("Pc", rows.iter().map(|r| r.2).collect()),
        ("Krw", rows.iter().map(|r| r.3).collect()),
        ("Kro", rows.iter().map(|r| r.4).collect()),
    ];
    KrelCycleTable::from_columns(columns).unwrap()
}

fn imbibition_and_drainage() -> KrelCycleTable {
    table(&[
        (1, 1.0, 0.0, 1.0, 0.0),
        (1, 0.2, 5.0, 0.0, 0.8),
        (2, 0.2, 3.0, 0.0, 0.8),
        (2, 0.4, 1.0, 0.1, 0.4),
        (2, 0.6, -1.0, 0.3, 0.1),
        (2, 0.8, -2.0, 0.5, 0.0),
        (3, 0.8, -2.0, 0.5, 0.0),
        (3, 0.6, -1.0, 0.3, 0.1),
        (3, 0.4, 1.0, 0.1, 0.4),
        (3, 0.2, 3.0, 0.0, 0.8),
    ])
}

#[test]
fn full_analysis() {
    let row = krel_curve_analysis(&imbibition_and_drainage());

    assert_eq!(row.swi, 0.2);
    assert_eq!(row.kro_swi, 0.8);
    assert_eq!(row.pc_swi, 1.0);
    assert_eq!(row.swr, 0.8);
    assert_eq!(row.krw_swr, 0.5);
    assert_eq!(row.pc_swr, -2.0);

    assert!(f64_eq(row.sw_cross, 0.52));
    assert!(f64_eq(row.k_cross, 0.22));
    assert!(f64_eq(row.pc_cross, -0.2));

    assert!(row.nw > 0.0);
    assert!(row.no > 0.0);

    // 吸入循环的 Iw = 0.5; 排驱循环的饱和度递减, 步长取下限, 穿越点贴近 0.6.
    assert!((row.amott - 1.0 / 6.0).abs() < 1e-4);
    assert!((row.usbm - 0.15 / 0.85).abs() < 1e-4);
}

#[test]
fn empty_imbibition_cycle() {
    let t = table(&[(1, 1.0, 0.0, 1.0, 0.0), (1, 0.2, 5.0, 0.0, 0.8)]);
    let row = krel_curve_analysis(&t);
    assert_eq!(row, KrelResultRow::default());
    assert!(row.entries().iter().all(|(_, v)| *v == 0.0));
}

#[test]
fn no_crossover() {
    let t = table(&[
        (2, 0.2, 1.0, 0.0, 0.9),
        (2, 0.5, 0.5, 0.1, 0.6),
        (2, 0.7, 0.2, 0.2, 0.3),
    ]);
    let row = krel_curve_analysis(&t);
    assert_eq!((row.sw_cross, row.k_cross, row.pc_cross), (0.0, 0.0, 0.0));
    assert_eq!(row.swi, 0.2);
    assert_eq!(row.swr, 0.7);
}

#[test]
fn wettability_absent_without_zero_crossing() {
    let t = table(&[
        (2, 0.2, 3.0, 0.0, 0.8),
        (2, 0.6, 1.0, 0.3, 0.1),
        (3, 0.6, 1.0, 0.3, 0.1),
        (3, 0.2, 3.0, 0.0, 0.8),
    ]);
    assert!(wettability_indices(&t).is_none());
    let row = krel_curve_analysis(&t);
    assert_eq!((row.amott, row.usbm), (0.0, 0.0));
}

#[test]
fn wettability_absent_with_negative_pressure() {
    let t = table(&[
        (2, 0.2, -0.5, 0.0, 0.8),
        (2, 0.6, -2.0, 0.3, 0.1),
        (2, 0.8, -4.0, 0.5, 0.0),
        (3, 0.8, -4.0, 0.5, 0.0),
        (3, 0.2, -0.5, 0.0, 0.8),
    ]);
    assert!(wettability_indices(&t).is_none());
    let row = krel_curve_analysis(&t);
    assert_eq!((row.amott, row.usbm), (0.0, 0.0));
}

#[test]
fn shape_factor_of_wide_flat_throat() {
    // r = 1, A = 100: 1 / 400 被截断到下限.
    assert_eq!(throat_shape_factor(2.0, 100.0), 0.01);
}

#[test]
fn result_frame_collects_parameter_sets() {
    let mut result = KrelResult::new();
    result.add_single_result(
        [("sample", Cell::from("A")), ("seed", Cell::from(1i64))],
        &imbibition_and_drainage(),
    );
    result.add_single_result([("sample", "B")], &table(&[(1, 1.0, 0.0, 1.0, 0.0)]));

    let frame = result.to_dataframe();
    assert_eq!(frame.rows().len(), 2);
    assert_eq!(frame.get(0, "result-swi").and_then(Cell::as_number), Some(0.2));
    assert_eq!(frame.get(1, "result-swi").and_then(Cell::as_number), Some(0.0));
    assert_eq!(frame.get(1, "input-seed"), Some(&Cell::Empty));

    let mut csv = Vec::new();
    frame.write_csv(&mut csv).unwrap();
    let csv = String::from_utf8(csv).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().next().unwrap().starts_with("input-sample,input-seed,result-swi,"));
}

#[test]
fn two_realization_mean() {
    // 实现 A: 循环 1 覆盖 [0, 0.5], Krw = Sw; 循环 2 把网格上限拉到 1.
    let a = table(&[
        (1, 0.0, 0.0, 0.0, 1.0),
        (1, 0.5, 0.0, 0.5, 0.5),
        (2, 0.0, 0.0, 0.0, 1.0),
        (2, 1.0, 0.0, 1.0, 0.0),
    ]);
    // 实现 B: 循环 1 覆盖 [0.25, 0.5], Krw = 1.
    let b = table(&[(1, 0.25, 0.0, 1.0, 0.0), (1, 0.5, 0.0, 1.0, 0.0)]);

    let d = KrelTables::get_complete_dict(&[a, b]);
    let sw = &d["Sw"];
    let mean = &d["Krw_middle"];

    // 网格步长 0.005.
    assert!(f64_eq(sw[20], 0.1));
    assert!(f64_eq(mean[20], 0.1));
    assert!(f64_eq(sw[80], 0.4));
    assert!(f64_eq(mean[80], 0.7));
    assert!(f64_eq(sw[160], 0.8));
    assert!(mean[160].is_nan());

    // 循环 2 只有实现 A.
    let i = KREL_GRID_POINTS + 100;
    assert!(f64_eq(mean[i], 0.5));
    assert!(d["Krw_1"][i].is_nan());
}
