//! End-to-end assembly of a science exposure summary, from raw header
//! mapping to rendered SVG bundles.

use ndarray::Array1;
use qa::camera::Camera;
use qa::identity::ExposureIdentity;
use qa::layout::{FiberPosition, FocalPlaneLayout};
use qa::spectra::{FiberSpectra, SpectrumTrace};
use qa::status::aggregate_status;
use qa::table::{AmpMetricRow, FiberMetricRow, MetricTable};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use viz::summary::{
    self, SummaryInputs, CALIBFLUX_BUNDLE, CALIBFLUX_METRIC, READNOISE_BUNDLE, READNOISE_METRIC,
    SPECTRA_BUNDLE,
};

fn header() -> BTreeMap<String, String> {
    [
        ("NIGHT", "20210314"),
        ("EXPID", "81504"),
        ("FLAVOR", "SCIENCE"),
        ("PROGRAM", "dark"),
        ("EXPTIME", "900.0"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn layout(n: u32) -> FocalPlaneLayout {
    FocalPlaneLayout::from_positions((0..n).map(|fiber| {
        let theta = fiber as f64 * 0.7;
        let r = 10.0 + fiber as f64 * 12.0;
        FiberPosition {
            fiber,
            x: r * theta.cos(),
            y: r * theta.sin(),
        }
    }))
}

fn fiber_table(night: i64, expid: i64) -> MetricTable {
    let mut rows = Vec::new();
    for (spectro, cam) in [(0u8, Camera::B), (0, Camera::R), (1, Camera::Z)] {
        for fiber in 0..20u32 {
            rows.push(FiberMetricRow {
                cam,
                spectro,
                fiber,
                values: [(
                    CALIBFLUX_METRIC.to_string(),
                    100.0 + fiber as f64 * 3.0,
                )]
                .into_iter()
                .collect(),
            });
        }
    }
    MetricTable::per_cam_fiber(night, expid, rows)
}

fn amp_table(night: i64, expid: i64) -> MetricTable {
    let mut rows = Vec::new();
    for cam in Camera::ALL {
        for amp in "ABCD".chars() {
            rows.push(AmpMetricRow {
                cam,
                spectro: 0,
                amp,
                values: [(READNOISE_METRIC.to_string(), if amp == 'D' { 4.8 } else { 2.2 })]
                    .into_iter()
                    .collect(),
            });
        }
    }
    MetricTable::per_amp(night, expid, rows)
}

fn spectra() -> FiberSpectra {
    let mut spectra = FiberSpectra::new();
    for fiber in 0..20u32 {
        let wavelength = Array1::linspace(3600.0, 9800.0, 400);
        let flux = wavelength.mapv(|w: f64| (w / 1000.0).sin() * (fiber as f64 + 1.0));
        spectra.insert(fiber, SpectrumTrace::new(wavelength, flux));
    }
    spectra
}

#[test]
fn science_exposure_summary() {
    let identity = ExposureIdentity::from_header(&header()).unwrap();
    assert_eq!(identity.night, 20210314);

    let codes: BTreeMap<String, i32> = [
        ("b0-qproc.log", 0),
        ("r0-qproc.log", 0),
        ("z1-qproc.log", 4),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();
    let status = aggregate_status(&identity, &codes);
    assert_eq!(status.len(), 3);

    let fiber_table = fiber_table(identity.night, identity.expid);
    let amp_table = amp_table(identity.night, identity.expid);
    let spectra = spectra();
    let layout = layout(25);

    let inputs = SummaryInputs {
        per_camfiber: Some(&fiber_table),
        per_amp: Some(&amp_table),
        spectra: Some(&spectra),
    };

    let mut rng = StdRng::seed_from_u64(81504);
    let bundles = summary::assemble(&identity, &status, &inputs, &layout, &mut rng);

    assert_eq!(
        bundles.names(),
        vec![CALIBFLUX_BUNDLE, READNOISE_BUNDLE, SPECTRA_BUNDLE]
    );

    // Metadata carries identity and the failed unit.
    assert_eq!(bundles.metadata.zexpid(), "00081504");
    assert_eq!(bundles.metadata.flavor, "SCIENCE");
    assert_eq!(bundles.metadata.exptime_label(), "900.0");
    assert_eq!(bundles.metadata.failed_units, vec!["Z1".to_string()]);

    // The calibrated-flux grid covers all three cameras in canonical order.
    match bundles.get(CALIBFLUX_BUNDLE).unwrap() {
        viz::summary::Bundle::Grid(grid) => {
            assert_eq!(grid.cameras(), Camera::ALL.to_vec());
        }
        other => panic!("expected a grid bundle, got {other:?}"),
    }

    // The out-of-family amplifiers are the three 'D' amps.
    match bundles.get(READNOISE_BUNDLE).unwrap() {
        viz::summary::Bundle::Amp(layer) => {
            assert_eq!(layer.out_of_range().len(), 3);
        }
        other => panic!("expected an amp bundle, got {other:?}"),
    }

    // Every bundle renders to an SVG document.
    for name in bundles.names() {
        let svg = bundles.get(name).unwrap().to_svg(750, 500).unwrap();
        assert!(svg.contains("<svg"), "{name} must render");
        assert!(svg.contains("</svg>"), "{name} must be a complete document");
    }
}
