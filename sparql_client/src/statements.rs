//! Statement-level operations, expressed as SPARQL updates and graph store requests.
//!
//! Terms are never spliced into the update text:
//! they are bound to variables through a `VALUES` block.
use crate::binding::BindingSet;
use crate::client::SparqlClient;
use crate::error::Error;
use crate::graph_store::{GraphDocument, GraphName, RdfFormat};
use crate::query::QueryRequest;
use crate::transaction::TransactionHandle;
use quadwire_term::{Iri, RdfTerm};
use std::path::Path;

/// The triple pattern shared by every statement operation.
const PATTERN: &str = "?s ?p ?o .";

impl SparqlClient {
    /// Add a statement to each graph of `contexts`,
    /// or to the default graph if `contexts` is empty.
    ///
    /// # Errors
    /// [`Error::Unsupported`] if `subject` is a literal,
    /// or if any term is a blank node (they can not be sent in a `VALUES` block).
    pub fn add_statement(
        &self,
        subject: &RdfTerm,
        predicate: &Iri,
        object: &RdfTerm,
        contexts: &[GraphName],
        tx: Option<&TransactionHandle>,
    ) -> Result<(), Error> {
        check_subject(subject)?;
        let mut bindings = BindingSet::new()
            .with("s", subject.clone())?
            .with("p", predicate.clone().into())?
            .with("o", object.clone())?;
        let template = if contexts.is_empty() {
            PATTERN.to_string()
        } else {
            graph_blocks(contexts, &mut bindings)?
        };
        let values = bindings.values_clause()?.unwrap_or_default();
        let update = format!("INSERT {{ {template} }} WHERE {{ {values} }}");
        self.update(&QueryRequest::new(update).with_transaction(tx))
    }

    /// Remove the statements matching the given terms,
    /// `None` matching any term,
    /// from each graph of `contexts`,
    /// or from every graph (including the default graph) if `contexts` is empty.
    pub fn remove_statements(
        &self,
        subject: Option<&RdfTerm>,
        predicate: Option<&Iri>,
        object: Option<&RdfTerm>,
        contexts: &[GraphName],
        tx: Option<&TransactionHandle>,
    ) -> Result<(), Error> {
        let mut bindings = BindingSet::new();
        if let Some(subject) = subject {
            check_subject(subject)?;
            bindings.bind("s", subject.clone())?;
        }
        if let Some(predicate) = predicate {
            bindings.bind("p", predicate.clone().into())?;
        }
        if let Some(object) = object {
            bindings.bind("o", object.clone())?;
        }
        let mut targets = Vec::with_capacity(contexts.len().max(2));
        if contexts.is_empty() {
            targets.push(PATTERN.to_string());
            targets.push(format!("GRAPH ?g {{ {PATTERN} }}"));
        } else {
            for (i, graph) in contexts.iter().enumerate() {
                targets.push(graph_block(i, graph, &mut bindings)?);
            }
        }
        let values = bindings.values_clause()?.unwrap_or_default();
        let update = targets
            .iter()
            .map(|target| format!("DELETE {{ {target} }} WHERE {{ {values} {target} }}"))
            .collect::<Vec<_>>()
            .join(" ;\n");
        self.update(&QueryRequest::new(update).with_transaction(tx))
    }

    /// Empty each graph of `contexts`,
    /// or the whole store if `contexts` is empty.
    ///
    /// All the graphs are emptied by a single update request.
    pub fn clear(
        &self,
        contexts: &[GraphName],
        tx: Option<&TransactionHandle>,
    ) -> Result<(), Error> {
        if contexts.is_empty() {
            return self.graph_delete_all(tx);
        }
        self.remove_statements(None, None, None, contexts, tx)
    }

    /// Add the content of the file at `path` to each graph of `contexts`,
    /// or to the default graph if `contexts` is empty.
    ///
    /// The file is read and sent once per graph,
    /// each in its own graph store request.
    /// With several `contexts`, pass a transaction (`tx`) for the file to be added
    /// to all of them or to none: otherwise a failure may leave it in the first few only.
    pub fn add_file<P: AsRef<Path>>(
        &self,
        path: P,
        format: RdfFormat,
        contexts: &[GraphName],
        tx: Option<&TransactionHandle>,
    ) -> Result<(), Error> {
        let path = path.as_ref();
        if contexts.is_empty() {
            return self.graph_merge(GraphDocument::open(path, format)?, &GraphName::Default, tx);
        }
        for graph in contexts {
            self.graph_merge(GraphDocument::open(path, format)?, graph, tx)?;
        }
        Ok(())
    }
}

fn check_subject(subject: &RdfTerm) -> Result<(), Error> {
    if let RdfTerm::Literal(_) = subject {
        return Err(Error::Unsupported(format!(
            "a literal can not be the subject of a statement: {subject}"
        )));
    }
    Ok(())
}

/// The `GRAPH` blocks inserting the pattern in every graph of `contexts`.
fn graph_blocks(contexts: &[GraphName], bindings: &mut BindingSet) -> Result<String, Error> {
    let mut blocks = Vec::with_capacity(contexts.len());
    for (i, graph) in contexts.iter().enumerate() {
        blocks.push(graph_block(i, graph, bindings)?);
    }
    Ok(blocks.join(" "))
}

/// The pattern in `graph`, which is bound to `?g{i}` if it is a named graph.
fn graph_block(i: usize, graph: &GraphName, bindings: &mut BindingSet) -> Result<String, Error> {
    match graph {
        GraphName::Default => Ok(PATTERN.to_string()),
        GraphName::Named(iri) => {
            let var = format!("g{i}");
            bindings.bind(&var, iri.clone().into())?;
            Ok(format!("GRAPH ?{var} {{ {PATTERN} }}"))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn iri(txt: &str) -> Iri {
        Iri::new_unchecked(txt)
    }

    #[test]
    fn graph_blocks_bind_named_graphs_only() {
        let mut bindings = BindingSet::new();
        let contexts = [
            GraphName::Named(iri("http://ex/g1")),
            GraphName::Default,
            GraphName::Named(iri("http://ex/g2")),
        ];
        let blocks = graph_blocks(&contexts, &mut bindings).unwrap();
        assert_eq!(
            blocks,
            "GRAPH ?g0 { ?s ?p ?o . } ?s ?p ?o . GRAPH ?g2 { ?s ?p ?o . }"
        );
        assert_eq!(bindings.variables().collect::<Vec<_>>(), vec!["g0", "g2"]);
    }

    #[test]
    fn literal_subject_is_rejected() {
        assert!(matches!(
            check_subject(&RdfTerm::literal("x")),
            Err(Error::Unsupported(_))
        ));
        assert!(check_subject(&iri("http://ex/s").into()).is_ok());
    }
}
