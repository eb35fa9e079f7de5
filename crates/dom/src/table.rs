//! Table element behavior: the live `rows` collection and row editing with
//! the tbody-creation policy.

use crate::collections::{CollectionFilter, HtmlCollection};
use crate::error::DomError;
use crate::node::{Node, NodeRef};
use crate::registry::ElementKind;

impl Node {
    fn require_table(&self) -> Result<(), DomError> {
        match self.as_element() {
            Some(el) if el.kind == ElementKind::Table => Ok(()),
            _ => Err(DomError::InvalidNodeType),
        }
    }

    /// Live `rows` collection (thead rows, then direct/tbody rows, then
    /// tfoot rows).
    pub fn table_rows(&self) -> Result<HtmlCollection, DomError> {
        self.require_table()?;
        Ok(HtmlCollection::new(
            self.handle(),
            CollectionFilter::TableRows,
        ))
    }

    /// Insert a new `<tr>` at `index` (`-1` appends). When the table has no
    /// rows the row goes into the last `<tbody>`, creating one if necessary.
    pub fn table_insert_row(&self, index: i32) -> Result<NodeRef, DomError> {
        self.require_table()?;
        let table = self.handle();
        let rows = table.table_rows()?.to_vec();
        if index < -1 || index as i64 > rows.len() as i64 {
            return Err(DomError::IndexSize);
        }
        let doc = table.owner_doc();
        let row = doc.create_element("tr").expect("known-valid name");
        if rows.is_empty() {
            let tbody = table
                .child_nodes()
                .into_iter()
                .rev()
                .find(|c| c.is_html_element("tbody"));
            let tbody = match tbody {
                Some(existing) => existing,
                None => {
                    let created = doc.create_element("tbody").expect("known-valid name");
                    table.append_child(&created)?;
                    created
                }
            };
            tbody.append_child(&row)?;
        } else if index == -1 || index as usize == rows.len() {
            let last = rows.last().expect("non-empty");
            let parent = last.parent().expect("collection rows are attached");
            parent.append_child(&row)?;
        } else {
            let reference = &rows[index as usize];
            let parent = reference.parent().expect("collection rows are attached");
            parent.insert_before(&row, Some(reference))?;
        }
        Ok(row)
    }

    /// Delete the row at `index` (`-1` deletes the last row; deleting from
    /// an empty table with `-1` is a no-op).
    pub fn table_delete_row(&self, index: i32) -> Result<(), DomError> {
        self.require_table()?;
        let rows = self.table_rows()?.to_vec();
        let target = if index == -1 {
            match rows.last() {
                Some(last) => last.clone(),
                None => return Ok(()),
            }
        } else {
            if index < 0 || index as usize >= rows.len() {
                return Err(DomError::IndexSize);
            }
            rows[index as usize].clone()
        };
        target.detach();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::document::Document;
    use crate::error::DomError;

    #[test]
    fn insert_row_creates_a_tbody_for_the_first_row() {
        let doc = Document::new_html();
        let table = doc.create_element("table").expect("valid");
        doc.body().expect("body").append_child(&table).expect("append");

        let row = table.table_insert_row(-1).expect("insert");
        let tbody = row.parent().expect("row is attached");
        assert!(tbody.is_html_element("tbody"));
        assert!(std::rc::Rc::ptr_eq(&tbody.parent().expect("attached"), &table));
        assert_eq!(table.table_rows().expect("rows").len(), 1);
    }

    #[test]
    fn rows_collection_is_live_and_section_ordered() {
        let doc = Document::new_html();
        let table = doc.create_element("table").expect("valid");
        let tfoot = doc.create_element("tfoot").expect("valid");
        let foot_row = doc.create_element("tr").expect("valid");
        tfoot.append_child(&foot_row).expect("append");
        table.append_child(&tfoot).expect("append");

        let rows = table.table_rows().expect("rows");
        assert_eq!(rows.len(), 1);

        let thead = doc.create_element("thead").expect("valid");
        let head_row = doc.create_element("tr").expect("valid");
        thead.append_child(&head_row).expect("append");
        table.append_child(&thead).expect("append");

        // Same collection object observes the mutation; thead rows sort first
        // even though thead was appended after tfoot.
        assert_eq!(rows.len(), 2);
        assert!(std::rc::Rc::ptr_eq(&rows.item(0).expect("head row"), &head_row));
        assert!(std::rc::Rc::ptr_eq(&rows.item(1).expect("foot row"), &foot_row));
    }

    #[test]
    fn insert_and_delete_row_bounds_checks() {
        let doc = Document::new_html();
        let table = doc.create_element("table").expect("valid");
        assert_eq!(table.table_insert_row(1).err(), Some(DomError::IndexSize));
        assert_eq!(table.table_insert_row(-2).err(), Some(DomError::IndexSize));
        assert_eq!(table.table_delete_row(0), Err(DomError::IndexSize));
        assert!(table.table_delete_row(-1).is_ok());

        table.table_insert_row(0).expect("first row");
        table.table_insert_row(1).expect("second row");
        let middle = table.table_insert_row(1).expect("middle row");
        let rows = table.table_rows().expect("rows");
        assert_eq!(rows.len(), 3);
        assert!(std::rc::Rc::ptr_eq(&rows.item(1).expect("middle"), &middle));
        table.table_delete_row(1).expect("delete middle");
        assert_eq!(rows.len(), 2);

        let div = doc.create_element("div").expect("valid");
        assert_eq!(div.table_rows().err(), Some(DomError::InvalidNodeType));
    }
}
