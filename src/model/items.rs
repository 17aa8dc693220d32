use crate::model::{Header, Mapping};
use crate::Result;
use anyhow::{bail, Context};
use std::fmt::Debug;

/// Row data from a sheet, parsed into `R` by header, together with the header mapping.
#[derive(Default, Debug, Clone, Eq, PartialEq)]
pub struct Table<R>
where
    R: Default + Debug + Clone + Eq + PartialEq + Row,
{
    mapping: Mapping,
    data: Vec<R>,
}

pub trait Row {
    /// Given the `header` name and the `value`, set the appropriate struct field.
    fn set_with_header(&mut self, header: &str, value: String) -> Result<()>;

    /// Given the `header` name, retrieve the appropriate struct field value.
    fn get_by_header(&self, header: &str) -> String;

    /// Given the order of the `headers`, convert the struct field values to a `Vec<String>` where
    /// the values appear in the right order according to the `headers` order.
    fn to_row(&self, headers: &[Header]) -> Vec<String> {
        headers
            .iter()
            .map(|h| self.get_by_header(h.as_ref()))
            .collect()
    }

    /// Records the 1-based sheet row (the header is row 1) that this item was read from.
    fn set_sheet_row(&mut self, sheet_row: usize);

    /// The 1-based sheet row this item was read from, or `None` for items not yet in a sheet.
    fn sheet_row(&self) -> Option<usize>;
}

fn parse_row<R>(headers: &[Header], values: Vec<String>, sheet_row: usize) -> Result<R>
where
    R: Default + Debug + Clone + Eq + PartialEq + Row,
{
    let mut item = R::default();
    for (ix, value) in values.into_iter().enumerate() {
        let header = headers
            .get(ix)
            .with_context(|| format!("No header found for column index {ix}"))?
            .as_ref();
        if header.is_empty() {
            continue;
        }
        item.set_with_header(header, value)
            .with_context(|| format!("Bad value in column '{header}' at row {sheet_row}"))?;
    }
    item.set_sheet_row(sheet_row);
    Ok(item)
}

impl<R> Table<R>
where
    R: Default + Debug + Clone + Eq + PartialEq + Row,
{
    /// Given the rows of a sheet, where the first row is the header, parse the headers and data
    /// into a `Table`. Rows where every cell is blank are skipped, but row numbering still counts
    /// them so that `sheet_row` points at the real sheet row.
    pub fn parse<S, RowIter, Rows>(sheet_data: Rows) -> Result<Self>
    where
        S: Into<String>,
        RowIter: IntoIterator<Item = S>,
        Rows: IntoIterator<Item = RowIter>,
    {
        let mut rows = sheet_data.into_iter();
        let mapping = match rows.next() {
            Some(header_row) => Mapping::new(header_row)?,
            None => bail!("A sheet without a header row cannot be parsed"),
        };

        let len = mapping.len();
        let mut data = Vec::new();

        for (row_ix, row) in rows.enumerate() {
            // Data rows start right after the header, which is sheet row 1.
            let sheet_row = row_ix + 2;
            let values: Vec<String> = row.into_iter().map(|s| s.into()).collect();
            if values.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            if values.len() > len {
                bail!("A row longer than the headers list was encountered at row {sheet_row}");
            }
            data.push(parse_row(mapping.headers(), values, sheet_row)?);
        }

        Ok(Self { mapping, data })
    }

    pub fn data(&self) -> &[R] {
        &self.data
    }

    pub(crate) fn data_mut(&mut self) -> &mut [R] {
        &mut self.data
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Converts all of the items back to sheet rows, with the header row first.
    pub fn to_rows(&self) -> Vec<Vec<String>> {
        let headers: Vec<String> = self
            .mapping
            .headers()
            .iter()
            .map(|h| h.as_ref().to_string())
            .collect();
        let mut rows = vec![headers];
        rows.extend(self.data.iter().map(|item| item.to_row(self.mapping.headers())));
        rows
    }
}
