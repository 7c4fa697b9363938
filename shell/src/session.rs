//! Interactive menu over a store.
//!
//! The session reads one answer per line and writes prompts and results as
//! plain text. It is generic over its input and output so it can be driven
//! from a script as well as a terminal.

use crate::input::{is_done, parse_value};
use docstore_engine::{Document, Store};
use std::io::{self, BufRead, Write};

const MENU: &str = "
--- Docstore Terminal Interface ---
1. Add Document
2. Retrieve Document
3. List Documents in Collection
4. Delete Document
5. Find Documents
6. Update Document
7. Add Nested Document
8. Retrieve Nested Document
0. Exit";

/// One interactive session.
pub struct Session<'a, R, W> {
    store: &'a Store,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Session<'a, R, W> {
    pub fn new(store: &'a Store, input: R, output: W) -> Self {
        Self {
            store,
            input,
            output,
        }
    }

    /// Run until the user exits or input ends.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            writeln!(self.output, "{}", MENU)?;
            let Some(choice) = self.prompt("Enter your choice: ")? else {
                return Ok(());
            };

            let finished = match choice.trim() {
                "1" => self.add_document()?,
                "2" => self.retrieve_document()?,
                "3" => self.list_documents()?,
                "4" => self.delete_document()?,
                "5" => self.find_documents()?,
                "6" => self.update_document()?,
                "7" => self.add_nested_document()?,
                "8" => self.retrieve_nested_document()?,
                "0" => {
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(());
                }
                _ => {
                    writeln!(self.output, "Invalid choice. Please try again.")?;
                    true
                }
            };

            // An action that ran out of input ends the session.
            if !finished {
                return Ok(());
            }
        }
    }

    /// Print a prompt and read one line without its line ending.
    ///
    /// Returns `None` at end of input.
    fn prompt(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    /// Prompt for field/value pairs until "done", applying each to `document`.
    fn read_fields(&mut self, document: &Document) -> io::Result<bool> {
        loop {
            let Some(field) = self.prompt("Enter field name (or 'done' to finish): ")? else {
                return Ok(false);
            };
            if is_done(&field) {
                return Ok(true);
            }

            let Some(raw) = self.prompt(&format!("Enter value for {}: ", field))? else {
                return Ok(false);
            };
            document.set(field, parse_value(&raw));
        }
    }

    fn save(&mut self) -> io::Result<()> {
        if let Err(e) = self.store.save() {
            tracing::error!(error = %e, "Failed to save store");
            writeln!(self.output, "Warning: changes are kept in memory but were not saved.")?;
        }
        Ok(())
    }

    fn add_document(&mut self) -> io::Result<bool> {
        let Some(collection) = self.prompt("Enter collection name: ")? else {
            return Ok(false);
        };
        let Some(id) = self.prompt("Enter document ID (empty for automatic): ")? else {
            return Ok(false);
        };

        let document = if id.is_empty() {
            self.store.add_document_with_auto_id(&collection)
        } else {
            self.store.add_document(&collection, id)
        };

        let completed = self.read_fields(&document)?;
        self.save()?;
        writeln!(self.output, "Document {} added successfully!", document.id())?;
        Ok(completed)
    }

    fn retrieve_document(&mut self) -> io::Result<bool> {
        let Some(collection) = self.prompt("Enter collection name: ")? else {
            return Ok(false);
        };
        let Some(id) = self.prompt("Enter document ID: ")? else {
            return Ok(false);
        };

        match self.store.get_document(&collection, &id) {
            Some(document) => writeln!(self.output, "Document found:\n{}", document)?,
            None => writeln!(self.output, "Document not found.")?,
        }
        Ok(true)
    }

    fn list_documents(&mut self) -> io::Result<bool> {
        let Some(collection) = self.prompt("Enter collection name: ")? else {
            return Ok(false);
        };

        let mut documents = self.store.get_documents(&collection);
        if documents.is_empty() {
            writeln!(self.output, "No documents found in the collection.")?;
        } else {
            documents.sort_by(|a, b| a.id().cmp(b.id()));
            writeln!(self.output, "Documents in collection:")?;
            self.print_documents(&documents)?;
        }
        Ok(true)
    }

    fn delete_document(&mut self) -> io::Result<bool> {
        let Some(collection) = self.prompt("Enter collection name: ")? else {
            return Ok(false);
        };
        let Some(id) = self.prompt("Enter document ID: ")? else {
            return Ok(false);
        };

        if self.store.delete_document(&collection, &id) {
            writeln!(self.output, "Document deleted successfully!")?;
        } else {
            writeln!(self.output, "Document not found or deletion failed.")?;
        }
        Ok(true)
    }

    fn find_documents(&mut self) -> io::Result<bool> {
        let Some(collection) = self.prompt("Enter collection name: ")? else {
            return Ok(false);
        };
        let Some(field) = self.prompt("Enter field to search: ")? else {
            return Ok(false);
        };
        let Some(raw) = self.prompt("Enter value to match: ")? else {
            return Ok(false);
        };

        let mut found = self
            .store
            .find_documents(&collection, &field, &parse_value(&raw));
        if found.is_empty() {
            writeln!(self.output, "No documents found matching the condition.")?;
        } else {
            found.sort_by(|a, b| a.id().cmp(b.id()));
            writeln!(self.output, "Matching documents:")?;
            self.print_documents(&found)?;
        }
        Ok(true)
    }

    fn update_document(&mut self) -> io::Result<bool> {
        let Some(collection) = self.prompt("Enter collection name: ")? else {
            return Ok(false);
        };
        let Some(id) = self.prompt("Enter document ID: ")? else {
            return Ok(false);
        };

        if self.store.get_document(&collection, &id).is_none() {
            writeln!(self.output, "Document not found.")?;
            return Ok(true);
        }

        loop {
            let Some(field) = self.prompt("Enter field name to update (or 'done' to finish): ")?
            else {
                return Ok(false);
            };
            if is_done(&field) {
                break;
            }
            let Some(raw) = self.prompt(&format!("Enter new value for {}: ", field))? else {
                return Ok(false);
            };
            self.store
                .update_document_field(&collection, &id, &field, parse_value(&raw));
        }

        writeln!(self.output, "Document updated successfully!")?;
        Ok(true)
    }

    fn add_nested_document(&mut self) -> io::Result<bool> {
        let Some(collection) = self.prompt("Enter collection name: ")? else {
            return Ok(false);
        };
        let Some(id) = self.prompt("Enter parent document ID: ")? else {
            return Ok(false);
        };

        let Some(parent) = self.store.get_document(&collection, &id) else {
            writeln!(self.output, "Document not found.")?;
            return Ok(true);
        };

        let Some(nested_collection) = self.prompt("Enter nested collection name: ")? else {
            return Ok(false);
        };
        let Some(nested_id) = self.prompt("Enter nested document ID: ")? else {
            return Ok(false);
        };

        let nested = parent.add_nested_document(nested_collection, nested_id);
        let completed = self.read_fields(&nested)?;
        self.save()?;
        writeln!(self.output, "Nested document {} added successfully!", nested.id())?;
        Ok(completed)
    }

    fn retrieve_nested_document(&mut self) -> io::Result<bool> {
        let mut answers = Vec::with_capacity(4);
        for label in [
            "Enter collection name: ",
            "Enter parent document ID: ",
            "Enter nested collection name: ",
            "Enter nested document ID: ",
        ] {
            let Some(answer) = self.prompt(label)? else {
                return Ok(false);
            };
            answers.push(answer);
        }

        match self
            .store
            .get_nested_document(&answers[0], &answers[1], &answers[2], &answers[3])
        {
            Some(document) => writeln!(self.output, "Document found:\n{}", document)?,
            None => writeln!(self.output, "Document not found.")?,
        }
        Ok(true)
    }

    fn print_documents(&mut self, documents: &[Document]) -> io::Result<()> {
        for document in documents {
            writeln!(self.output, "{}", document)?;
        }
        Ok(())
    }
}
