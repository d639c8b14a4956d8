//! Code to interface with CASA measurement sets.
//!
//! More info: https://casa.nrao.edu/Memos/229.html#SECTION00060000000000000000

use std::path::Path;

use log::{debug, trace, warn};
use marlu::{c32, rubbl_casatables};
use ndarray::prelude::*;
use rubbl_casatables::{Table, TableOpenMode};
use strum::IntoEnumIterator;
use vec1::Vec1;

use super::{DataGroup, MsMeta, MsReadError, Partition, VisRead};
use crate::{
    dataset::{Dataset, Dim, Variable},
    units::{FreqFrame, FreqUnit},
};

/// Optional main-table columns with one value per channel and polarisation.
const SPECTRUM_COL_NAMES: [&str; 2] = ["WEIGHT_SPECTRUM", "SIGMA_SPECTRUM"];

/// Scalar integer columns of the main table.
const INT_COL_NAMES: [&str; 8] = [
    "ANTENNA1",
    "ANTENNA2",
    "FEED1",
    "FEED2",
    "SCAN_NUMBER",
    "FIELD_ID",
    "OBSERVATION_ID",
    "STATE_ID",
];

/// Open a measurement set table read only. If `table` is `None`, then open the
/// base table.
fn read_table(ms: &Path, table: Option<&str>) -> Result<Table, MsReadError> {
    let t = Table::open(
        format!("{}/{}", ms.display(), table.unwrap_or("")),
        TableOpenMode::Read,
    )?;
    Ok(t)
}

/// The unit of the `CHAN_FREQ` column, from its `QuantumUnits` keyword. MSs
/// without a usable unit are assumed to be in Hz.
fn chan_freq_unit(spw_table: &mut Table) -> FreqUnit {
    let units: Result<Vec<String>, MsReadError> = spw_table
        .get_column_keyword_record("CHAN_FREQ")
        .map_err(MsReadError::from)
        .and_then(|mut kw| kw.get_field("QuantumUnits").map_err(MsReadError::from));
    match units {
        Ok(units) => match units.first().map(|u| FreqUnit::parse(u)) {
            Some(Ok(unit)) => unit,
            Some(Err(e)) => {
                warn!("{e}; assuming CHAN_FREQ is in Hz");
                FreqUnit::Hz
            }
            None => {
                warn!("CHAN_FREQ has an empty QuantumUnits keyword; assuming Hz");
                FreqUnit::Hz
            }
        },
        Err(e) => {
            warn!("Couldn't read the unit of CHAN_FREQ ({e}); assuming Hz");
            FreqUnit::Hz
        }
    }
}

#[derive(Debug, Clone)]
struct SpectralWindow {
    name: String,
    chan_freqs: Vec<f64>,
    freq_unit: FreqUnit,
    frame: FreqFrame,
}

/// The main-table rows belonging to one data description.
#[derive(Debug, Clone)]
struct DataDescription {
    ddid: usize,
    spw_id: usize,
    corr_types: Vec<i32>,
    rows: Vec<u64>,
}

pub struct MsReader {
    meta: MsMeta,

    data_group: DataGroup,

    spws: Vec<SpectralWindow>,

    /// Only data descriptions with rows in the main table.
    data_descs: Vec<DataDescription>,

    /// Which of the optional spectrum columns are present.
    spectrum_cols: Vec<&'static str>,

    /// The data groups whose column is present.
    data_groups: Vec<DataGroup>,
}

impl MsReader {
    /// Verify and populate metadata associated with this measurement set.
    pub fn new<P: AsRef<Path>>(ms: P, data_group: DataGroup) -> Result<MsReader, MsReadError> {
        let ms = ms.as_ref();
        debug!("Using measurement set: {}", ms.display());
        if !ms.exists() {
            return Err(MsReadError::BadFile(ms.to_path_buf()));
        }

        let mut main_table = read_table(ms, None)?;
        if main_table.n_rows() == 0 {
            return Err(MsReadError::MainTableEmpty);
        }
        let col_names = main_table.column_names()?;
        let data_col_name = data_group.column();
        if !col_names.iter().any(|c| c == data_col_name) {
            return Err(MsReadError::NoDataGroup {
                group: data_group,
                column: data_col_name,
            });
        }
        let data_groups: Vec<DataGroup> = DataGroup::iter()
            .filter(|g| col_names.iter().any(|c| c == g.column()))
            .collect();
        debug!("Available data groups: {data_groups:?}");
        let spectrum_cols: Vec<&'static str> = SPECTRUM_COL_NAMES
            .into_iter()
            .filter(|&name| col_names.iter().any(|c| c == name))
            .collect();
        trace!("Optional spectrum columns: {spectrum_cols:?}");

        let antenna_names: Vec<String> = {
            let mut antenna_table = read_table(ms, Some("ANTENNA"))?;
            antenna_table.get_col_as_vec("NAME")?
        };
        trace!("There are {} antenna names", antenna_names.len());
        let antenna_names =
            Vec1::try_from_vec(antenna_names).map_err(|_| MsReadError::AntennaTableEmpty)?;

        let spws = {
            let mut spw_table = read_table(ms, Some("SPECTRAL_WINDOW"))?;
            let freq_unit = chan_freq_unit(&mut spw_table);
            trace!("Channel frequencies are in {freq_unit}");
            let mut spws = Vec::with_capacity(spw_table.n_rows() as usize);
            for i_spw in 0..spw_table.n_rows() {
                let chan_freqs: Vec<f64> = spw_table.get_cell_as_vec("CHAN_FREQ", i_spw)?;
                let name: String = spw_table.get_cell("NAME", i_spw)?;
                let frame = FreqFrame::from_meas_freq_ref(spw_table.get_cell("MEAS_FREQ_REF", i_spw)?)?;
                trace!(
                    "Spectral window {i_spw} ({name}): {} channels, frame {frame}",
                    chan_freqs.len()
                );
                spws.push(SpectralWindow {
                    name,
                    chan_freqs,
                    freq_unit,
                    frame,
                });
            }
            spws
        };

        let pol_setups: Vec<Vec<i32>> = {
            let mut pol_table = read_table(ms, Some("POLARIZATION"))?;
            (0..pol_table.n_rows())
                .map(|i| pol_table.get_cell_as_vec("CORR_TYPE", i))
                .collect::<Result<_, _>>()?
        };

        let (dd_spws, dd_pols): (Vec<i32>, Vec<i32>) = {
            let mut dd_table = read_table(ms, Some("DATA_DESCRIPTION"))?;
            (
                dd_table.get_col_as_vec("SPECTRAL_WINDOW_ID")?,
                dd_table.get_col_as_vec("POLARIZATION_ID")?,
            )
        };

        let field_names: Vec<String> = {
            let mut field_table = read_table(ms, Some("FIELD"))?;
            field_table.get_col_as_vec("NAME")?
        };

        // The STATE table is optional.
        let intents: Vec<String> = match read_table(ms, Some("STATE")) {
            Ok(mut state_table) if state_table.n_rows() > 0 => state_table.get_col_as_vec("OBS_MODE")?,
            Ok(_) => vec![],
            Err(e) => {
                debug!("Not reading intents: {e}");
                vec![]
            }
        };

        let mut rows_per_ddid: Vec<Vec<u64>> = vec![vec![]; dd_spws.len()];
        let ddids: Vec<i32> = main_table.get_col_as_vec("DATA_DESC_ID")?;
        for (i_row, &ddid) in ddids.iter().enumerate() {
            let rows = usize::try_from(ddid)
                .ok()
                .and_then(|i| rows_per_ddid.get_mut(i))
                .ok_or(MsReadError::BadDataDescription {
                    ddid,
                    num: dd_spws.len(),
                })?;
            rows.push(i_row as u64);
        }

        let mut data_descs = vec![];
        for (ddid, rows) in rows_per_ddid.into_iter().enumerate() {
            if rows.is_empty() {
                debug!("Data description {ddid} has no rows; skipping");
                continue;
            }
            let spw_id = usize::try_from(dd_spws[ddid])
                .ok()
                .filter(|&i| i < spws.len())
                .ok_or(MsReadError::BadDataDescriptionRef {
                    ddid,
                    table: "SPECTRAL_WINDOW",
                    id: dd_spws[ddid],
                })?;
            let corr_types = usize::try_from(dd_pols[ddid])
                .ok()
                .and_then(|i| pol_setups.get(i))
                .cloned()
                .ok_or(MsReadError::BadDataDescriptionRef {
                    ddid,
                    table: "POLARIZATION",
                    id: dd_pols[ddid],
                })?;
            data_descs.push(DataDescription {
                ddid,
                spw_id,
                corr_types,
                rows,
            });
        }
        debug!(
            "{} partitions across {} spectral windows",
            data_descs.len(),
            spws.len()
        );

        Ok(MsReader {
            meta: MsMeta {
                path: ms.to_path_buf(),
                antenna_names,
                field_names,
                intents,
            },
            data_group,
            spws,
            data_descs,
            spectrum_cols,
            data_groups,
        })
    }

    fn read_partition_inner(&self, dd: &DataDescription) -> Result<Partition, MsReadError> {
        let spw = &self.spws[dd.spw_id];
        let num_rows = dd.rows.len();
        let num_chans = spw.chan_freqs.len();
        let num_pols = dd.corr_types.len();
        let data_col_name = self.data_group.column();
        trace!(
            "Reading data description {}: {num_rows} rows, {num_chans} channels, {num_pols} pols",
            dd.ddid
        );

        let mut main_table = read_table(&self.meta.path, None)?;
        let mut ds = Dataset::new(spw.freq_unit);

        // Scalar columns.
        let times: Vec<f64> = main_table.get_col_as_vec("TIME")?;
        let intervals: Vec<f64> = main_table.get_col_as_vec("INTERVAL")?;
        let pick = |col: &[f64]| Array1::from_iter(dd.rows.iter().map(|&r| col[r as usize]));
        ds.insert_var("TIME", Variable::new(&[Dim::Row], pick(&times)))?;
        ds.insert_var("INTERVAL", Variable::new(&[Dim::Row], pick(&intervals)))?;
        for col_name in INT_COL_NAMES {
            let col: Vec<i32> = main_table.get_col_as_vec(col_name)?;
            let values = Array1::from_iter(dd.rows.iter().map(|&r| col[r as usize]));
            ds.insert_var(col_name, Variable::new(&[Dim::Row], values))?;
        }

        // Array columns, one cell at a time.
        let mut uvws = Array2::zeros((num_rows, 3));
        let mut data = Array3::from_elem((num_rows, num_chans, num_pols), c32::default());
        let mut flags = Array3::from_elem((num_rows, num_chans, num_pols), false);
        let mut weights = Array2::zeros((num_rows, num_pols));
        let mut sigmas = Array2::zeros((num_rows, num_pols));
        let check_len = |column: &'static str, row_index: u64, got: usize, expected_len: usize| {
            if got == expected_len {
                Ok(())
            } else {
                Err(MsReadError::BadArraySize {
                    column,
                    row_index,
                    expected_len,
                    got,
                })
            }
        };
        for (i_row, &row) in dd.rows.iter().enumerate() {
            let uvw: Vec<f64> = main_table.get_cell_as_vec("UVW", row)?;
            check_len("UVW", row, uvw.len(), 3)?;
            uvws.row_mut(i_row).assign(&ArrayView1::from(&uvw));

            // The data array is arranged [frequency][pol].
            let vis: Vec<c32> = main_table.get_cell_as_vec(data_col_name, row)?;
            check_len(data_col_name, row, vis.len(), num_chans * num_pols)?;
            data.slice_mut(s![i_row, .., ..])
                .assign(&ArrayView2::from_shape((num_chans, num_pols), &vis).map_err(|_| {
                    MsReadError::BadArraySize {
                        column: data_col_name,
                        row_index: row,
                        expected_len: num_chans * num_pols,
                        got: vis.len(),
                    }
                })?);

            let flag: Vec<bool> = main_table.get_cell_as_vec("FLAG", row)?;
            check_len("FLAG", row, flag.len(), num_chans * num_pols)?;
            for (out, f) in flags.slice_mut(s![i_row, .., ..]).iter_mut().zip(flag) {
                *out = f;
            }

            let weight: Vec<f32> = main_table.get_cell_as_vec("WEIGHT", row)?;
            check_len("WEIGHT", row, weight.len(), num_pols)?;
            let sigma: Vec<f32> = main_table.get_cell_as_vec("SIGMA", row)?;
            check_len("SIGMA", row, sigma.len(), num_pols)?;
            for i_pol in 0..num_pols {
                weights[(i_row, i_pol)] = f64::from(weight[i_pol]);
                sigmas[(i_row, i_pol)] = f64::from(sigma[i_pol]);
            }
        }
        ds.insert_var("DATA", Variable::new(&[Dim::Row, Dim::Chan, Dim::Pol], data))?;
        ds.insert_var("FLAG", Variable::new(&[Dim::Row, Dim::Chan, Dim::Pol], flags))?;
        ds.insert_var("WEIGHT", Variable::new(&[Dim::Row, Dim::Pol], weights))?;
        ds.insert_var("SIGMA", Variable::new(&[Dim::Row, Dim::Pol], sigmas))?;
        ds.insert_var("UVW", Variable::new(&[Dim::Row, Dim::UvwIndex], uvws))?;

        for &col_name in &self.spectrum_cols {
            let mut spectrum = Array3::zeros((num_rows, num_chans, num_pols));
            let mut readable = true;
            for (i_row, &row) in dd.rows.iter().enumerate() {
                let cell: Result<Vec<f32>, _> = main_table.get_cell_as_vec(col_name, row);
                let cell = match cell {
                    Ok(c) => c,
                    // Columns can exist with undefined cells.
                    Err(e) if i_row == 0 => {
                        debug!("Not reading {col_name}: {e}");
                        readable = false;
                        break;
                    }
                    Err(e) => return Err(e.into()),
                };
                check_len(col_name, row, cell.len(), num_chans * num_pols)?;
                for (out, v) in spectrum.slice_mut(s![i_row, .., ..]).iter_mut().zip(cell) {
                    *out = f64::from(v);
                }
            }
            if readable {
                ds.insert_var(
                    col_name,
                    Variable::new(&[Dim::Row, Dim::Chan, Dim::Pol], spectrum),
                )?;
            }
        }

        ds.insert_coord(
            "chan",
            Variable::new(&[Dim::Chan], Array1::from(spw.chan_freqs.clone())),
        )?;
        ds.insert_coord(
            "pol",
            Variable::new(&[Dim::Pol], Array1::from(dd.corr_types.clone())),
        )?;
        ds.insert_coord(
            "spw_id",
            Variable::new(&[Dim::Row], Array1::from_elem(num_rows, dd.spw_id as i32)),
        )?;

        if dd.corr_types.is_empty() {
            warn!("Data description {} has no polarisations", dd.ddid);
        }

        Ok(Partition {
            ddid: dd.ddid,
            spw_id: dd.spw_id,
            spw_name: spw.name.clone(),
            frame: spw.frame,
            corr_types: dd.corr_types.clone(),
            dataset: ds,
        })
    }
}

impl VisRead for MsReader {
    fn meta(&self) -> &MsMeta {
        &self.meta
    }

    fn data_group(&self) -> DataGroup {
        self.data_group
    }

    fn data_groups(&self) -> Vec<DataGroup> {
        self.data_groups.clone()
    }

    fn num_partitions(&self) -> usize {
        self.data_descs.len()
    }

    fn read_partition(&self, index: usize) -> Result<Partition, MsReadError> {
        let dd = self
            .data_descs
            .get(index)
            .ok_or(MsReadError::NoSuchPartition {
                index,
                num: self.data_descs.len(),
            })?;
        self.read_partition_inner(dd)
    }
}
